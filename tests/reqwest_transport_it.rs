#![cfg(feature = "reqwest")]

// std
use std::{env, fs, path::PathBuf, process};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use lightspeed_client::{
	_preludet::*,
	dispatch::{ApiCall, FilePayload},
	error::RequestError,
	rate_limit::BucketLevel,
};

fn client(server: &MockServer) -> ReqwestTestClient {
	let (client, _) = build_reqwest_test_client(&server.base_url(), "client-1", "secret-1");

	client.set_token(fresh_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	client
}

fn temp_image(tag: &str) -> PathBuf {
	let dir = env::temp_dir().join(format!(
		"lightspeed_client_{tag}_{}_{}",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));

	fs::create_dir_all(&dir).expect("Temporary directory should be creatable.");

	let path = dir.join("back.png");

	fs::write(&path, b"PNG-FROM-DISK").expect("Temporary image should be writable.");

	path
}

#[tokio::test]
async fn json_body_is_sent_with_content_type_and_bearer() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/API/Account/42/Item/7.json")
				.header("authorization", "Bearer AT1")
				.header("content-type", "application/json")
				.json_body(json!({ "description": "Mug" }));
			then.status(200)
				.header("x-ls-api-bucket-level", "2.5/60")
				.json_body(json!({ "Item": { "itemID": "7" } }));
		})
		.await;
	let client = client(&server);
	let body = client
		.account_request(ApiCall::put("Item/7.json").data(json!({ "description": "Mug" })))
		.await
		.expect("PUT should succeed.");

	mock.assert_async().await;

	assert_eq!(body["Item"]["itemID"], "7");
	assert_eq!(client.bucket_level(), Some(BucketLevel::new(2.5, 60.)));
}

#[tokio::test]
async fn image_upload_sends_data_and_image_parts() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/API/Account/42/Item/7/Image.json")
				.header("authorization", "Bearer AT1")
				.body_includes("name=\"data\"")
				.body_includes(r#"{"description":"front"}"#)
				.body_includes("name=\"image\"; filename=\"front.png\"")
				.body_includes("PNG-BYTES");
			then.status(200).json_body(json!({ "ok": true }));
		})
		.await;
	let body = client(&server)
		.account_request(
			ApiCall::post("Item/7/Image.json")
				.data(json!({ "description": "front" }))
				.file(FilePayload::from_bytes(b"PNG-BYTES".to_vec()).file_name("front.png")),
		)
		.await
		.expect("Multipart upload should succeed.");

	mock.assert_async().await;

	assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn image_read_from_disk_defaults_to_its_file_name() {
	let path = temp_image("upload");
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/API/Account/42/Item/7/Image.json")
				.body_includes("name=\"data\"")
				.body_includes(r#"{"description":"back"}"#)
				.body_includes("name=\"image\"; filename=\"back.png\"")
				.body_includes("PNG-FROM-DISK");
			then.status(200).json_body(json!({ "ok": true }));
		})
		.await;

	client(&server)
		.account_request(
			ApiCall::post("Item/7/Image.json")
				.data(json!({ "description": "back" }))
				.file(FilePayload::from_path(&path)),
		)
		.await
		.expect("Upload from disk should succeed.");

	mock.assert_async().await;

	let _ = fs::remove_dir_all(path.parent().expect("Temporary image should have a parent."));
}

#[tokio::test]
async fn error_status_keeps_raw_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/API/Account/42/Sale.json");
			then.status(404).body(r#"{"httpCode":"404","message":"Not Found"}"#);
		})
		.await;

	let err = client(&server)
		.account_request(ApiCall::get("Sale.json"))
		.await
		.expect_err("404 should surface as an error.");

	assert!(matches!(err, Error::Request(RequestError::Status { status: 404, .. })));
	assert_eq!(err.to_string(), r#"{"httpCode":"404","message":"Not Found"}"#);
}

#[tokio::test]
async fn unsendable_token_is_a_build_error_not_a_transport_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.path("/API/Account/42/Item.json");
			then.status(200).json_body(json!({ "Item": [] }));
		})
		.await;
	let client = client(&server);

	client.set_token(fresh_token("AT\nbad", "RT1"));

	let err = client
		.account_request(ApiCall::get("Item.json"))
		.await
		.expect_err("A token with a newline cannot be sent.");

	mock.assert_calls_async(0).await;

	assert!(matches!(err, Error::Request(RequestError::Build { .. })));
	assert_eq!(err.to_string(), "HTTP request could not be constructed.");
}

#[tokio::test]
async fn query_parameters_reach_the_server() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/API/Account/42/Item.json")
				.query_param("load_relations", "[\"Category\"]")
				.query_param("limit", "10");
			then.status(200).json_body(json!({ "Item": [] }));
		})
		.await;

	client(&server)
		.account_request(
			ApiCall::get("Item.json").queries([("load_relations", "[\"Category\"]"), ("limit", "10")]),
		)
		.await
		.expect("GET with query should succeed.");

	mock.assert_async().await;
}
