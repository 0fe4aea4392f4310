//! Client-level error types shared across flows, dispatch, and stores.

// std
use std::{io, path::PathBuf};
// self
use crate::{_prelude::*, auth::IdentifierError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Account-scoped call without a usable account identifier.
	#[error(transparent)]
	Account(#[from] AccountError),
	/// Token missing, or the token endpoint call failed.
	#[error(transparent)]
	Token(#[from] TokenError),
	/// API call failed at the transport or HTTP-status level.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token sink (persistence hook) failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Request(err) => err.code(),
			Self::Token(TokenError::Endpoint { source }) => source.code(),
			_ => None,
		}
	}
}

/// Failures raised before an account-scoped call is dispatched.
#[derive(Debug, ThisError)]
pub enum AccountError {
	/// No account identifier has been configured on the client.
	#[error("Account identifier is not set.")]
	MissingAccountId,
	/// The supplied account identifier failed validation.
	#[error(transparent)]
	InvalidAccountId(#[from] IdentifierError),
}

/// Token lifecycle failures (missing token, exchange/refresh errors).
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// No token has been set, exchanged, or hydrated yet.
	#[error("Token is not set.")]
	NotSet,
	/// The token endpoint call failed.
	#[error("Token endpoint request failed: {source}")]
	Endpoint {
		/// Underlying dispatch failure.
		#[source]
		source: RequestError,
	},
	/// The token endpoint responded with a payload missing required fields.
	#[error("Token endpoint returned a malformed token response.")]
	InvalidResponse {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Neither the response nor the current token carries a refresh token.
	#[error("Token endpoint response is missing refresh_token and no previous refresh token is held.")]
	MissingRefreshToken,
	/// The token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// The token endpoint returned an `expires_in` beyond the representable range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// The `state` returned by the authorization redirect does not match.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Dispatch failures for a single API round trip.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// The API answered with a non-success status; the message is the raw response body.
	#[error("{body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body (possibly empty).
		body: String,
	},
	/// The transport failed without producing any response.
	#[error("Client error: the transport returned no response.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// A successful response carried a body that is not valid JSON.
	#[error("Response body (status {status}) is not valid JSON.")]
	Decode {
		/// HTTP status code of the response.
		status: u16,
		/// JSON parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Request data could not be serialized to JSON.
	#[error("Request data could not be serialized to JSON.")]
	Encode(#[source] serde_json::Error),
	/// The file payload could not be read.
	#[error("Failed to read file payload {}.", .path.display())]
	File {
		/// Path supplied by the caller.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: io::Error,
	},
	/// The endpoint cannot be resolved against the API base URL.
	#[error("Endpoint `{endpoint}` cannot be resolved against the API base URL.")]
	InvalidEndpoint {
		/// Endpoint supplied by the caller.
		endpoint: String,
		/// Underlying URL parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The transport could not build the outbound request.
	#[error("HTTP request could not be constructed.")]
	Build {
		/// Transport-specific builder failure.
		#[source]
		source: BoxError,
	},
}
impl RequestError {
	/// Wraps a transport failure that produced no response.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Wraps a transport's request-builder failure.
	pub fn build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Build { source: Box::new(src) }
	}

	/// HTTP status code, when a response was received.
	pub fn code(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Raw response body for status failures.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Status { body, .. } => Some(body),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Client secret is empty.
	#[error("Client secret cannot be empty.")]
	MissingClientSecret,
	/// An endpoint URL is unusable as a request base.
	#[error("The {endpoint} endpoint must be an http(s) URL: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Token endpoint path is empty.
	#[error("Token endpoint path cannot be empty.")]
	MissingTokenEndpoint,
	/// Bucket-level header name is empty.
	#[error("Bucket-level header name cannot be empty.")]
	MissingBucketHeader,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_error_message_is_raw_body() {
		let err = RequestError::Status { status: 429, body: String::new() };

		assert_eq!(err.to_string(), "");
		assert_eq!(err.code(), Some(429));
		assert_eq!(err.body(), Some(""));

		let err = RequestError::Status { status: 404, body: "{\"message\":\"nope\"}".into() };

		assert_eq!(err.to_string(), "{\"message\":\"nope\"}");
	}

	#[test]
	fn transport_error_has_generic_message_and_no_code() {
		let io = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
		let err = RequestError::transport(io);

		assert_eq!(err.code(), None);
		assert!(err.body().is_none());
		assert!(StdError::source(&err).is_some());
	}

	#[test]
	fn client_error_exposes_nested_status() {
		let err: Error =
			TokenError::Endpoint { source: RequestError::Status { status: 401, body: "no".into() } }
				.into();

		assert_eq!(err.status(), Some(401));
		assert_eq!(Error::from(AccountError::MissingAccountId).status(), None);
	}
}
