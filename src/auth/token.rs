//! Immutable access/refresh token pair with a safety-adjusted expiry instant.

pub mod secret;

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::TokenError};

/// Amount shaved off the server-declared lifetime so a token never expires mid-flight.
pub const EXPIRY_SAFETY_MARGIN: Duration = Duration::seconds(1);

/// Access/refresh token pair issued by the token endpoint.
///
/// Tokens are immutable; a refresh produces a new value instead of mutating the old one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	access_token: TokenSecret,
	refresh_token: TokenSecret,
	#[serde(with = "time::serde::rfc3339")]
	expires_at: OffsetDateTime,
}
impl Token {
	/// Rebuilds a token from previously persisted parts.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
		}
	}

	/// Builds a token from a grant response issued at `issued_at`.
	///
	/// The expiry is `issued_at + expires_in - EXPIRY_SAFETY_MARGIN`.
	pub fn from_grant(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in: Duration,
		issued_at: OffsetDateTime,
	) -> Result<Self, TokenError> {
		if !expires_in.is_positive() {
			return Err(TokenError::NonPositiveExpiresIn);
		}

		let expires_at = issued_at
			.checked_add(expires_in - EXPIRY_SAFETY_MARGIN)
			.ok_or(TokenError::ExpiresInOutOfRange)?;

		Ok(Self::new(access_token, refresh_token, expires_at))
	}

	/// Access token to send as the bearer credential.
	pub fn access_token(&self) -> &str {
		self.access_token.expose()
	}

	/// Refresh token used for the `refresh_token` grant.
	pub fn refresh_token(&self) -> &str {
		self.refresh_token.expose()
	}

	/// Instant after which the token is considered expired.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Returns `true` if `instant` is strictly after the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
