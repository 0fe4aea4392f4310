//! Refresh grant and the proactive ensure-valid check.
//!
//! Refresh is proactive only: a token is renewed when the local clock says it expired, never in
//! reaction to a 401 from the API. The refresh grant and the ensure-valid re-check both run
//! under the manager's async guard, so callers racing on the same expired token produce one
//! token endpoint call; the others observe the renewed token after the guard is released.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Token,
	dispatch::ApiExecutor,
	error::TokenError,
	flows::{GRANT_REFRESH_TOKEN, TokenManager},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl TokenManager {
	/// Performs the refresh grant with the current token's refresh token.
	///
	/// Fails with [`TokenError::NotSet`] when no token is held. When the response omits a new
	/// refresh token, the previous one is kept.
	pub async fn refresh<T>(&self, executor: &ApiExecutor<T>) -> Result<Token>
	where
		T: ApiTransport,
	{
		let _singleflight = self.guard.lock().await;

		self.refresh_locked(executor).await
	}

	/// Returns the current token, refreshing it first when it has expired.
	///
	/// Fails with [`TokenError::NotSet`] when no token has ever been set.
	pub async fn ensure_valid<T>(&self, executor: &ApiExecutor<T>) -> Result<Token>
	where
		T: ApiTransport,
	{
		match self.token() {
			None => return Err(TokenError::NotSet.into()),
			Some(token) if !token.is_expired() => return Ok(token),
			Some(_) => {},
		}

		let _singleflight = self.guard.lock().await;

		// Another caller may have refreshed while this one waited for the guard.
		match self.token() {
			Some(token) if !token.is_expired() => Ok(token),
			_ => self.refresh_locked(executor).await,
		}
	}

	async fn refresh_locked<T>(&self, executor: &ApiExecutor<T>) -> Result<Token>
	where
		T: ApiTransport,
	{
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let current = self.token().ok_or(TokenError::NotSet)?;

				self.refresh_metrics.record(FlowOutcome::Attempt);

				let config = executor.config();
				let form = serde_json::json!({
					"refresh_token": current.refresh_token(),
					"client_id": config.client_id,
					"client_secret": config.client_secret.expose(),
					"grant_type": GRANT_REFRESH_TOKEN,
				});
				let issued_at = OffsetDateTime::now_utc();
				let outcome = match self.request_grant(executor, form).await {
					Ok(response) => self.install(response, issued_at).await,
					Err(e) => Err(e),
				};

				self.refresh_metrics.record(match &outcome {
					Ok(_) => FlowOutcome::Success,
					Err(_) => FlowOutcome::Failure,
				});

				outcome
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
