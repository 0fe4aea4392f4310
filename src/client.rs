//! Public façade: configuration, hooks, token lifecycle, and account-scoped requests.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet, Token},
	config::ClientConfig,
	dispatch::{ApiCall, RequestDispatcher},
	error::AccountError,
	flows::{self, AuthorizationSession, RefreshMetrics},
	http::ApiTransport,
	rate_limit::{BucketLevel, RateLimitSink},
	store::TokenSink,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestTransport>;

/// Lightspeed API client.
///
/// One client owns one token and one bucket-level reading; separate clients share nothing. All
/// methods take `&self`, so a client can be wrapped in an `Arc` and used from several tasks.
pub struct Client<T>
where
	T: ApiTransport,
{
	dispatcher: RequestDispatcher<T>,
	account_id: RwLock<Option<AccountId>>,
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}

	/// Creates a client from a customized reqwest builder (timeouts, proxies, user agent).
	pub fn from_reqwest_builder(
		config: ClientConfig,
		builder: reqwest::ClientBuilder,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_transport(config, ReqwestTransport::with_client(builder.build()?)))
	}
}
impl<T> Client<T>
where
	T: ApiTransport,
{
	/// Creates a client over any [`ApiTransport`].
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Self {
		Self {
			dispatcher: RequestDispatcher::new(transport.into(), Arc::new(config)),
			account_id: RwLock::new(None),
		}
	}

	/// Installs the hook that persists every newly issued token.
	pub fn with_token_sink(mut self, sink: Arc<dyn TokenSink>) -> Self {
		self.dispatcher = self.dispatcher.with_token_sink(sink);

		self
	}

	/// Installs the hook invoked with every bucket level; awaiting in it delays the caller.
	pub fn with_rate_limit_sink(mut self, sink: Arc<dyn RateLimitSink>) -> Self {
		self.dispatcher = self.dispatcher.with_rate_limit_sink(sink);

		self
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		self.dispatcher.config()
	}

	/// Underlying dispatcher.
	pub fn dispatcher(&self) -> &RequestDispatcher<T> {
		&self.dispatcher
	}

	/// Sets the account used by [`Client::account_request`].
	pub fn set_account_id(&self, account_id: impl AsRef<str>) -> Result<AccountId, AccountError> {
		let id = AccountId::new(account_id)?;

		*self.account_id.write() = Some(id.clone());

		Ok(id)
	}

	/// Configured account, if any.
	pub fn account_id(&self) -> Option<AccountId> {
		self.account_id.read().clone()
	}

	/// Authorization page URL for `scope`, with an optional caller-managed `state`.
	pub fn authorize_url(&self, scope: &ScopeSet, state: Option<&str>) -> Url {
		flows::authorize_url(self.config(), scope, state)
	}

	/// Starts an authorization round trip with a freshly generated `state`.
	pub fn start_authorization(&self, scope: ScopeSet) -> AuthorizationSession {
		AuthorizationSession::new(self.config(), scope)
	}

	/// Exchanges the code from the authorization redirect for a token.
	pub async fn exchange_authorization_code(&self, code: &str) -> Result<Token> {
		self.dispatcher.exchange_authorization_code(code).await
	}

	/// Forces a refresh grant.
	pub async fn refresh_token(&self) -> Result<Token> {
		self.dispatcher.refresh_token().await
	}

	/// Hydrates the client with a previously persisted token; the sink is not called.
	pub fn set_token(&self, token: Token) {
		self.dispatcher.tokens().set_token(token);
	}

	/// Snapshot of the current token.
	pub fn token(&self) -> Option<Token> {
		self.dispatcher.tokens().token()
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.dispatcher.refresh_metrics()
	}

	/// Latest bucket level reported by the API.
	pub fn bucket_level(&self) -> Option<BucketLevel> {
		self.dispatcher.bucket_level()
	}

	/// Sends `call` to its endpoint as given (resolved against the API base).
	pub async fn request(&self, call: ApiCall) -> Result<Value> {
		self.dispatcher.send(call).await
	}

	/// Sends `call` under `/API/Account/{account_id}/`.
	///
	/// Fails with [`AccountError::MissingAccountId`] before any network activity when no account
	/// is configured.
	pub async fn account_request(&self, call: ApiCall) -> Result<Value> {
		let account_id = self.account_id().ok_or(AccountError::MissingAccountId)?;
		let endpoint = account_endpoint(&account_id, call.endpoint());

		self.dispatcher.send(call.with_endpoint(endpoint)).await
	}
}
impl<T> Debug for Client<T>
where
	T: ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("account_id", &self.account_id())
			.field("dispatcher", &self.dispatcher)
			.finish()
	}
}

/// `/API/Account/{id}/{endpoint}`; an empty endpoint addresses the account itself.
pub fn account_endpoint(account_id: &AccountId, endpoint: &str) -> String {
	let endpoint = endpoint.trim_start_matches('/');

	if endpoint.is_empty() {
		format!("/API/Account/{account_id}")
	} else {
		format!("/API/Account/{account_id}/{endpoint}")
	}
}
