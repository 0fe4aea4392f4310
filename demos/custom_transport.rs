//! Plugs a scripted transport into the client to show the token and rate-limit paths offline.
//!
//! 1. Implement [`ApiTransport`] and return `Ok(ApiResponse)` for every HTTP status.
//! 2. Build the client with [`Client::with_transport`] and hydrate it from a token store.
//! 3. Observe the refresh, the bucket-level hook, and a `429` surfacing as a status error.

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{Arc, Mutex},
};
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
// self
use lightspeed_client::{
	auth::Token,
	client::Client,
	config::ClientConfig,
	dispatch::ApiCall,
	error::{Error, RequestError},
	http::{ApiRequest, ApiResponse, ApiTransport, TransportFuture},
	rate_limit::BucketLevel,
	store::{MemoryTokenStore, TokenSource},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = ScriptedTransport::new([
		ApiResponse::new(200, r#"{"access_token":"AT2","expires_in":1800}"#),
		ApiResponse::new(200, r#"{"Account":{"accountID":"42"}}"#)
			.with_header("X-LS-API-Bucket-Level", "12/60"),
		ApiResponse::new(429, "").with_header("X-LS-API-Bucket-Level", "60/60"),
	]);
	// A session persisted earlier whose access token has since expired.
	let store = Arc::new(MemoryTokenStore::with_token(Token::new(
		"AT1",
		"RT1",
		OffsetDateTime::now_utc() - Duration::minutes(5),
	)));
	let config = ClientConfig::builder("demo", "secret").build()?;
	let client = Client::<ScriptedTransport>::with_transport(config, transport)
		.with_token_sink(store.clone())
		.with_rate_limit_sink(Arc::new(|level: BucketLevel| async move {
			println!("Bucket at {:.0}%.", level.ratio() * 100.);
		}));

	if let Some(token) = store.load().await? {
		client.set_token(token);
	}

	client.set_account_id("42")?;

	let account = client.account_request(ApiCall::get("")).await?;

	println!("Refreshed to {:?} and fetched {account}.", client.token());
	println!("The store now holds {} tokens.", store.saves());

	match client.account_request(ApiCall::get("Item.json")).await {
		Err(Error::Request(err @ RequestError::Status { .. })) =>
			println!("Throttled with status {:?} and body {:?}.", err.code(), err.to_string()),
		other => println!("Unexpected outcome: {other:?}."),
	}

	Ok(())
}

/// Replays canned responses in order; fails once the script runs out.
struct ScriptedTransport(Mutex<VecDeque<ApiResponse>>);
impl ScriptedTransport {
	fn new(responses: impl IntoIterator<Item = ApiResponse>) -> Self {
		Self(Mutex::new(responses.into_iter().collect()))
	}
}
impl ApiTransport for ScriptedTransport {
	type TransportError = ScriptExhausted;

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError> {
		println!("{} {}", request.method, request.url);

		let next = self.0.lock().map_err(|_| ScriptExhausted).map(|mut q| q.pop_front());

		Box::pin(async move { next?.ok_or(ScriptExhausted) })
	}
}

#[derive(Debug)]
struct ScriptExhausted;
impl Display for ScriptExhausted {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("scripted transport has no responses left")
	}
}
impl StdError for ScriptExhausted {}
