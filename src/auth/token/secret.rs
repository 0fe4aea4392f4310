//! Wrapper for credentials that must not leak through `Debug` or `Display`.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Access token, refresh token, or client secret.
///
/// Formatting always prints `<redacted>`. Serialization writes the raw value so
/// [`FileTokenStore`](crate::store::FileTokenStore) can persist it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw credential for request bodies and the `Authorization` header.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
