//! Token lifecycle: authorization-code exchange, refresh, and ensure-valid.
//!
//! [`TokenManager`] owns the single current [`Token`]. Grants are sent through the
//! unauthenticated [`ApiExecutor`] so the token endpoint never re-enters the authorization path.
//! Every mutation of the current token happens under one async guard, which also makes
//! concurrent callers racing on an expired token share a single refresh.

pub mod authorization;
pub mod refresh;

pub use authorization::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::Token,
	dispatch::{ApiCall, ApiExecutor},
	error::TokenError,
	http::ApiTransport,
	store::TokenSink,
};

/// `grant_type` value for the authorization-code exchange.
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
/// `grant_type` value for the refresh grant.
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Owner of the current token and of the persistence hook.
#[derive(Default)]
pub struct TokenManager {
	current: RwLock<Option<Token>>,
	guard: AsyncMutex<()>,
	sink: Option<Arc<dyn TokenSink>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl TokenManager {
	/// Creates a manager without a token or hook.
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs the persistence hook.
	pub fn with_sink(mut self, sink: Arc<dyn TokenSink>) -> Self {
		self.sink = Some(sink);

		self
	}

	/// Replaces the current token without validation or hook invocation.
	pub fn set_token(&self, token: Token) {
		*self.current.write() = Some(token);
	}

	/// Snapshot of the current token.
	pub fn token(&self) -> Option<Token> {
		self.current.read().clone()
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	async fn request_grant<T>(&self, executor: &ApiExecutor<T>, form: Value) -> Result<TokenResponse>
	where
		T: ApiTransport,
	{
		let call = ApiCall::post(executor.config().token_endpoint.clone()).data(form);
		let body = executor
			.execute(call, None)
			.await
			.map_err(|source| TokenError::Endpoint { source })?;

		serde_path_to_error::deserialize(body)
			.map_err(|source| TokenError::InvalidResponse { source }.into())
	}

	/// Builds the token from a grant response, installs it, then hands it to the sink.
	///
	/// The new token is installed even when the sink fails; the sink error still propagates.
	async fn install(&self, response: TokenResponse, issued_at: OffsetDateTime) -> Result<Token> {
		let TokenResponse { access_token, expires_in, refresh_token } = response;
		let refresh_token = match refresh_token {
			Some(refresh) => refresh,
			None => self
				.token()
				.map(|current| current.refresh_token().to_owned())
				.ok_or(TokenError::MissingRefreshToken)?,
		};
		let token =
			Token::from_grant(access_token, refresh_token, Duration::seconds(expires_in), issued_at)?;

		self.set_token(token.clone());

		if let Some(sink) = &self.sink {
			sink.store(&token).await?;
		}

		Ok(token)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("current", &self.current.read())
			.field("sink_set", &self.sink.is_some())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: i64,
	#[serde(default)]
	refresh_token: Option<String>,
}
