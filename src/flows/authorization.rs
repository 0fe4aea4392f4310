//! Authorization-code grant: authorize URL, redirect `state`, and code exchange.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Token},
	config::ClientConfig,
	dispatch::ApiExecutor,
	error::TokenError,
	flows::{GRANT_AUTHORIZATION_CODE, TokenManager},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const STATE_LEN: usize = 32;

/// Authorization redirect metadata returned by
/// [`Client::start_authorization`](crate::client::Client::start_authorization).
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Requested scopes.
	pub scope: ScopeSet,
	/// Opaque value that must come back unchanged on the redirect.
	pub state: String,
	/// Authorization page the user agent should be sent to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Generates a random `state` and builds the matching authorize URL.
	pub fn new(config: &ClientConfig, scope: ScopeSet) -> Self {
		let state = random_string(STATE_LEN);
		let authorize_url = authorize_url(config, &scope, Some(&state));

		Self { scope, state, authorize_url }
	}

	/// Validates the `state` returned by the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<(), TokenError> {
		if returned_state == self.state { Ok(()) } else { Err(TokenError::StateMismatch) }
	}
}

/// Builds the authorization page URL.
///
/// Query order is `response_type`, `client_id`, `scope`, then `state` when provided. Scopes are
/// space-joined, which form encoding renders as `+`.
pub fn authorize_url(config: &ClientConfig, scope: &ScopeSet, state: Option<&str>) -> Url {
	let mut url = config.authorize_endpoint.clone();

	{
		let mut pairs = url.query_pairs_mut();

		pairs
			.append_pair("response_type", "code")
			.append_pair("client_id", &config.client_id)
			.append_pair("scope", &scope.normalized());

		if let Some(state) = state {
			pairs.append_pair("state", state);
		}
	}

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

impl TokenManager {
	/// Exchanges a one-time authorization code for a token, installs it, and calls the sink.
	pub async fn exchange_authorization_code<T>(
		&self,
		executor: &ApiExecutor<T>,
		code: &str,
	) -> Result<Token>
	where
		T: ApiTransport,
	{
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_authorization_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _guard = self.guard.lock().await;
				let config = executor.config();
				let form = serde_json::json!({
					"client_id": config.client_id,
					"client_secret": config.client_secret.expose(),
					"code": code,
					"grant_type": GRANT_AUTHORIZATION_CODE,
				});
				let issued_at = OffsetDateTime::now_utc();
				let response = self.request_grant(executor, form).await?;

				self.install(response, issued_at).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ClientConfig {
		ClientConfig::builder("client-1", "secret").build().expect("Default config should build.")
	}

	#[test]
	fn authorize_url_orders_and_encodes_parameters() {
		let scope = ScopeSet::new(["employee:all", "employee:register"])
			.expect("Scope fixture should be valid.");
		let url = authorize_url(&config(), &scope, Some("xyz"));

		assert_eq!(
			url.as_str(),
			"https://cloud.lightspeedapp.com/oauth/authorize.php?response_type=code&client_id=client-1&scope=employee%3Aall+employee%3Aregister&state=xyz"
		);
		assert!(!authorize_url(&config(), &scope, None).as_str().contains("state="));
	}

	#[test]
	fn session_state_is_random_and_validated() {
		let scope = ScopeSet::new(["employee:all"]).expect("Scope fixture should be valid.");
		let a = AuthorizationSession::new(&config(), scope.clone());
		let b = AuthorizationSession::new(&config(), scope);

		assert_eq!(a.state.len(), STATE_LEN);
		assert!(a.state.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a.state, b.state);
		assert!(a.authorize_url.as_str().ends_with(&format!("&state={}", a.state)));
		assert!(a.validate_state(&a.state).is_ok());
		assert!(matches!(a.validate_state(&b.state), Err(TokenError::StateMismatch)));
	}
}
