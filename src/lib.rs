//! Async Lightspeed Retail API client: OAuth 2.0 authorization-code + refresh-token lifecycle,
//! bearer-authenticated request dispatch, and bucket-level rate-limit signaling in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod rate_limit;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{auth::Token, config::ClientConfig};
	#[cfg(feature = "reqwest")]
	use crate::{
		client::Client,
		http::ReqwestTransport,
		store::{MemoryTokenStore, TokenSink},
	};

	/// Client type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestClient = Client<ReqwestTransport>;

	/// Builds a [`ClientConfig`] whose API base points at a mock server (e.g. `httpmock`).
	pub fn test_config(base_url: &str, client_id: &str, client_secret: &str) -> ClientConfig {
		let api_base = Url::parse(base_url).expect("Failed to parse mock API base URL.");

		ClientConfig::builder(client_id, client_secret)
			.api_base(api_base)
			.build()
			.expect("Failed to build client config for tests.")
	}

	/// Constructs a [`Client`] backed by the reqwest transport and an in-memory token store that
	/// records every token the client persists.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(
		base_url: &str,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestTestClient, Arc<MemoryTokenStore>) {
		let store = Arc::new(MemoryTokenStore::default());
		let sink: Arc<dyn TokenSink> = store.clone();
		let client = ReqwestTestClient::new(test_config(base_url, client_id, client_secret))
			.with_token_sink(sink);

		(client, store)
	}

	/// Returns a token that stays valid for the next hour.
	pub fn fresh_token(access: &str, refresh: &str) -> Token {
		Token::new(access, refresh, OffsetDateTime::now_utc() + Duration::hours(1))
	}

	/// Returns a token that expired a minute ago.
	pub fn expired_token(access: &str, refresh: &str) -> Token {
		Token::new(access, refresh, OffsetDateTime::now_utc() - Duration::minutes(1))
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
