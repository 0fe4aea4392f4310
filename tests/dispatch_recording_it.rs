// std
use std::{
	convert::Infallible,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use serde_json::json;
// self
use lightspeed_client::{
	_preludet::*,
	client::Client,
	config::DEFAULT_API_BASE,
	dispatch::{ApiCall, FilePayload},
	error::{AccountError, RequestError, TokenError},
	http::{ApiRequest, ApiResponse, ApiTransport, PartContent, RequestBody, TransportFuture},
	rate_limit::BucketLevel,
	store::{MemoryTokenStore, TokenSource},
};

const TOKEN_PATH: &str = "/oauth/access_token.php";

/// Answers the token endpoint with a fresh grant (after a short delay) and every other path with
/// the configured API response, recording each request.
struct RecordingTransport {
	requests: Mutex<Vec<ApiRequest>>,
	api_response: Mutex<ApiResponse>,
	token_calls: AtomicUsize,
}
impl RecordingTransport {
	fn new(api_response: ApiResponse) -> Arc<Self> {
		Arc::new(Self {
			requests: Mutex::new(Vec::new()),
			api_response: Mutex::new(api_response),
			token_calls: AtomicUsize::new(0),
		})
	}

	fn requests(&self) -> Vec<ApiRequest> {
		self.requests.lock().clone()
	}

	fn token_calls(&self) -> usize {
		self.token_calls.load(Ordering::SeqCst)
	}
}
impl ApiTransport for RecordingTransport {
	type TransportError = Infallible;

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError> {
		let is_token = request.url.path() == TOKEN_PATH;

		self.requests.lock().push(request);

		Box::pin(async move {
			if is_token {
				let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

				tokio::time::sleep(StdDuration::from_millis(20)).await;

				Ok(ApiResponse::new(
					200,
					json!({ "access_token": format!("AT-refreshed-{n}"), "expires_in": 3600 })
						.to_string(),
				))
			} else {
				Ok(self.api_response.lock().clone())
			}
		})
	}
}

fn client(transport: Arc<RecordingTransport>) -> (Client<RecordingTransport>, Arc<MemoryTokenStore>) {
	let store = Arc::new(MemoryTokenStore::default());
	let client = Client::<RecordingTransport>::with_transport(
		test_config(DEFAULT_API_BASE, "client-1", "secret-1"),
		transport,
	)
	.with_token_sink(store.clone());

	(client, store)
}

#[tokio::test]
async fn body_encoding_follows_data_and_file() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, _) = client(transport.clone());

	client.set_token(fresh_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	for call in [
		ApiCall::get("Item.json"),
		ApiCall::get("Item.json").data(json!({})),
		ApiCall::put("Item/1.json").data(json!({ "description": "Mug" })),
		ApiCall::post("Item/1/Image.json")
			.data(json!({ "description": "front" }))
			.file(FilePayload::from_bytes(b"PNG".to_vec()).file_name("front.png")),
	] {
		client.account_request(call).await.expect("Recorded call should succeed.");
	}

	let requests = transport.requests();

	assert_eq!(requests.len(), 4);
	assert_eq!(requests[0].body, RequestBody::Empty);
	assert_eq!(requests[1].body, RequestBody::Empty);
	assert_eq!(requests[2].body, RequestBody::Json(json!({ "description": "Mug" })));

	let RequestBody::Multipart(form) = &requests[3].body else {
		panic!("File upload should be sent as multipart.");
	};

	assert_eq!(form.parts.len(), 2);
	assert_eq!(form.parts[0].name, "data");
	assert_eq!(form.parts[0].content, PartContent::Text(r#"{"description":"front"}"#.into()));
	assert_eq!(form.parts[1].name, "image");
	assert_eq!(
		form.parts[1].content,
		PartContent::File { bytes: b"PNG".to_vec(), file_name: Some("front.png".into()) }
	);

	for request in &requests {
		assert_eq!(request.header("Authorization"), Some("Bearer AT1"));
		assert!(request.url.path().starts_with("/API/Account/42/"));
	}
}

#[tokio::test]
async fn missing_token_fails_before_network() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, _) = client(transport.clone());
	let err = client
		.request(ApiCall::get("/API/Account.json"))
		.await
		.expect_err("Request without a token should fail.");

	assert!(matches!(err, Error::Token(TokenError::NotSet)));
	assert_eq!(err.to_string(), "Token is not set.");
	assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn missing_account_fails_before_network() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, _) = client(transport.clone());

	client.set_token(fresh_token("AT1", "RT1"));

	let err = client
		.account_request(ApiCall::get("Item.json"))
		.await
		.expect_err("Account call without an account should fail.");

	assert!(matches!(err, Error::Account(AccountError::MissingAccountId)));
	assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn token_endpoint_requests_skip_authorization() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, store) = client(transport.clone());
	let body = client
		.request(ApiCall::post(TOKEN_PATH).data(json!({ "grant_type": "refresh_token" })))
		.await
		.expect("Raw token endpoint call should not need a token.");

	assert_eq!(body["access_token"], Value::from("AT-refreshed-1"));
	assert_eq!(transport.requests()[0].header("Authorization"), None);
	assert_eq!(store.saves(), 0, "Raw calls do not install tokens.");
	assert_eq!(client.token(), None);
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, store) = client(transport.clone());

	client.set_token(expired_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	client.account_request(ApiCall::get("Item.json")).await.expect("First call should succeed.");
	client.account_request(ApiCall::get("Item.json")).await.expect("Second call should succeed.");

	let requests = transport.requests();

	assert_eq!(transport.token_calls(), 1);
	assert_eq!(requests.len(), 3);
	assert_eq!(
		requests[0].body,
		RequestBody::Json(json!({
			"refresh_token": "RT1",
			"client_id": "client-1",
			"client_secret": "secret-1",
			"grant_type": "refresh_token",
		}))
	);
	assert_eq!(requests[1].header("authorization"), Some("Bearer AT-refreshed-1"));
	assert_eq!(requests[2].header("authorization"), Some("Bearer AT-refreshed-1"));
	assert_eq!(store.saves(), 1);
	assert_eq!(store.latest().map(|t| t.refresh_token().to_owned()).as_deref(), Some("RT1"));
}

#[tokio::test]
async fn persisted_session_is_hydrated_then_refreshed() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let store = Arc::new(MemoryTokenStore::with_token(expired_token("AT0", "RT0")));
	let client = Client::<RecordingTransport>::with_transport(
		test_config(DEFAULT_API_BASE, "client-1", "secret-1"),
		transport.clone(),
	)
	.with_token_sink(store.clone());

	if let Some(token) = store.load().await.expect("Seeded store should load.") {
		client.set_token(token);
	}

	client.set_account_id("42").expect("Account fixture should be valid.");
	client.account_request(ApiCall::get("Item.json")).await.expect("Call should succeed.");

	let stored = store.stored();

	assert_eq!(transport.token_calls(), 1);
	assert_eq!(stored.len(), 2);
	assert_eq!(stored[1].access_token(), "AT-refreshed-1");
	assert_eq!(stored[1].refresh_token(), "RT0");
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let transport = RecordingTransport::new(ApiResponse::new(200, "{}"));
	let (client, store) = client(transport.clone());

	client.set_token(expired_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	let (a, b, c) = tokio::join!(
		client.account_request(ApiCall::get("Item.json")),
		client.account_request(ApiCall::get("Sale.json")),
		client.account_request(ApiCall::get("Customer.json")),
	);

	a.expect("First concurrent call should succeed.");
	b.expect("Second concurrent call should succeed.");
	c.expect("Third concurrent call should succeed.");

	assert_eq!(transport.token_calls(), 1);
	assert_eq!(store.saves(), 1);
	assert_eq!(client.refresh_metrics().attempts(), 1);
}

#[tokio::test]
async fn rate_limited_response_surfaces_raw_body_and_status() {
	let transport = RecordingTransport::new(
		ApiResponse::new(429, "").with_header("x-ls-api-bucket-level", "60/60"),
	);
	let seen = Arc::new(Mutex::new(Vec::new()));
	let hook_seen = seen.clone();
	let (client, _) = client(transport.clone());
	let client = client.with_rate_limit_sink(Arc::new(move |level: BucketLevel| {
		hook_seen.lock().push(level);

		async {}
	}));

	client.set_token(fresh_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	let err = client
		.account_request(ApiCall::get("Item.json"))
		.await
		.expect_err("429 should surface as an error.");

	assert!(matches!(err, Error::Request(RequestError::Status { status: 429, .. })));
	assert_eq!(err.to_string(), "");
	assert_eq!(err.status(), Some(429));
	assert_eq!(*seen.lock(), vec![BucketLevel::new(60., 60.)]);
	assert_eq!(client.bucket_level(), Some(BucketLevel::new(60., 60.)));
}

#[tokio::test]
async fn rate_limit_hook_delays_the_caller() {
	let transport = RecordingTransport::new(
		ApiResponse::new(200, "[]").with_header("X-LS-API-Bucket-Level", "59/60"),
	);
	let (client, _) = client(transport);
	let client = client.with_rate_limit_sink(Arc::new(|level: BucketLevel| async move {
		if level.ratio() > 0.9 {
			tokio::time::sleep(StdDuration::from_millis(50)).await;
		}
	}));

	client.set_token(fresh_token("AT1", "RT1"));
	client.set_account_id("42").expect("Account fixture should be valid.");

	let started = tokio::time::Instant::now();
	let body = client
		.account_request(ApiCall::get("Item.json"))
		.await
		.expect("Throttled call should still succeed.");

	assert_eq!(body, json!([]));
	assert!(started.elapsed() >= StdDuration::from_millis(50));
}
