//! Lightspeed account identifier used to build account-scoped endpoints.

// self
use crate::_prelude::*;

const ACCOUNT_ID_MAX_LEN: usize = 128;

/// Error returned when an account identifier cannot be used as a path segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Account identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace.
	#[error("Account identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier contains `/`, `?` or `#`.
	#[error("Account identifier contains the reserved character `{character}`.")]
	ReservedCharacter {
		/// Offending character.
		character: char,
	},
	/// The identifier is longer than 128 bytes.
	#[error("Account identifier exceeds {max} bytes.")]
	TooLong {
		/// Maximum permitted length in bytes.
		max: usize,
	},
}

/// Account identifier inserted after `/API/Account/` in account-scoped calls.
///
/// Lightspeed account IDs are numeric in practice, but any value that stays inside a single path
/// segment is accepted.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);
impl AccountId {
	/// Validates and wraps an account identifier.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let raw = value.as_ref();

		check_segment(raw)?;

		Ok(Self(raw.to_owned()))
	}

	/// Returns the identifier as it appears in the endpoint path.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AccountId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl TryFrom<String> for AccountId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		check_segment(&value)?;

		Ok(Self(value))
	}
}
impl From<AccountId> for String {
	fn from(value: AccountId) -> Self {
		value.0
	}
}
impl FromStr for AccountId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Account({})", self.0)
	}
}
impl Display for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn check_segment(raw: &str) -> Result<(), IdentifierError> {
	if raw.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if raw.len() > ACCOUNT_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: ACCOUNT_ID_MAX_LEN });
	}

	for character in raw.chars() {
		if character.is_whitespace() {
			return Err(IdentifierError::ContainsWhitespace);
		}
		if matches!(character, '/' | '?' | '#') {
			return Err(IdentifierError::ReservedCharacter { character });
		}
	}

	Ok(())
}
