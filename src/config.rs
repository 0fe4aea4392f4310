//! Immutable client configuration (credentials, endpoints, rate-limit header).
//!
//! The configuration is assembled through [`ClientConfigBuilder`], validated once, and then
//! shared read-only by every component. The account identifier is deliberately *not* part of it:
//! it may be assigned on the [`Client`](crate::client::Client) after construction.

/// Builder API for assembling client configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Default REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.lightspeedapp.com/";
/// Default authorization page users are redirected to.
pub const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://cloud.lightspeedapp.com/oauth/authorize.php";
/// Default token endpoint path, resolved against the API base.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "/oauth/access_token.php";
/// Default response header that carries the bucket level.
pub const DEFAULT_BUCKET_LEVEL_HEADER: &str = "X-LS-API-Bucket-Level";

/// Validated configuration consumed by the dispatcher, token manager, and façade.
#[derive(Clone)]
pub struct ClientConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Base URL every endpoint is resolved against.
	pub api_base: Url,
	/// Authorization page URL.
	pub authorize_endpoint: Url,
	/// Token endpoint path; requests to it skip bearer authorization.
	pub token_endpoint: String,
	/// Name of the bucket-level response header (matched case-insensitively).
	pub bucket_level_header: String,
}
impl ClientConfig {
	/// Creates a new builder for the provided credentials.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder::new(client_id, client_secret)
	}

	/// Returns `true` if `endpoint` addresses the token endpoint.
	pub fn is_token_endpoint(&self, endpoint: &str) -> bool {
		endpoint.trim_start_matches('/') == self.token_endpoint.trim_start_matches('/')
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("api_base", &self.api_base.as_str())
			.field("authorize_endpoint", &self.authorize_endpoint.as_str())
			.field("token_endpoint", &self.token_endpoint)
			.field("bucket_level_header", &self.bucket_level_header)
			.finish()
	}
}
