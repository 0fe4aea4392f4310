//! Walks through the authorization-code round trip and an account-scoped request.
//!
//! 1. Hydrate the client from a JSON token file when one exists.
//! 2. Otherwise print the authorize URL and exchange the `code` passed as the first argument.
//! 3. Throttle on the server's bucket level before the next request goes out.
//!
//! ```sh
//! LIGHTSPEED_CLIENT_ID=.. LIGHTSPEED_CLIENT_SECRET=.. LIGHTSPEED_ACCOUNT_ID=.. \
//!     cargo run --example authorize_and_fetch -- <code>
//! ```

// std
use std::{env, sync::Arc, time::Duration};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use lightspeed_client::{
	auth::ScopeSet,
	client::Client,
	config::ClientConfig,
	dispatch::ApiCall,
	rate_limit::BucketLevel,
	store::{FileTokenStore, TokenSource},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::builder(
		env::var("LIGHTSPEED_CLIENT_ID")?,
		env::var("LIGHTSPEED_CLIENT_SECRET")?,
	)
	.build()?;
	let store = Arc::new(FileTokenStore::new(env::temp_dir().join("lightspeed_demo_token.json")));
	let client = Client::new(config).with_token_sink(store.clone()).with_rate_limit_sink(
		Arc::new(|level: BucketLevel| async move {
			// Back off once the bucket is more than 80% full.
			if level.ratio() > 0.8 {
				tokio::time::sleep(Duration::from_secs(1)).await;
			}
		}),
	);

	match store.load().await? {
		Some(token) => client.set_token(token),
		None => {
			let session = client.start_authorization(ScopeSet::new(["employee:all"])?);

			println!("Send your user to {}.", session.authorize_url);

			let code = env::args()
				.nth(1)
				.ok_or_else(|| eyre!("Pass the `code` from the redirect as the first argument."))?;
			let token = client.exchange_authorization_code(&code).await?;

			println!("Token stored at {}, valid until {}.", store.path().display(), token.expires_at());
		},
	}

	client.set_account_id(env::var("LIGHTSPEED_ACCOUNT_ID")?)?;

	let account = client.account_request(ApiCall::get("")).await?;

	println!("Account: {account}.");

	let items = client.account_request(ApiCall::get("Item.json").query("limit", "5")).await?;

	println!("Items: {items}.");

	if let Some(level) = client.bucket_level() {
		println!("Bucket level {}/{} ({} remaining).", level.level, level.max, level.remaining());
	}

	Ok(())
}
