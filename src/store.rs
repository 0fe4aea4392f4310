//! Token persistence contracts and built-in stores.
//!
//! The client never loads tokens on its own; callers hydrate it through [`TokenSource`] (or
//! [`Client::set_token`](crate::client::Client::set_token)) and receive every newly issued token
//! through [`TokenSink`].

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence hook invoked once per successful exchange or refresh.
///
/// Errors are not swallowed: they surface to the caller of the exchange or refresh as
/// [`Error::Storage`](crate::error::Error::Storage).
pub trait TokenSink
where
	Self: Send + Sync,
{
	/// Persists the freshly issued token.
	fn store<'a>(&'a self, token: &'a Token) -> StoreFuture<'a, ()>;
}

/// Read side used by callers to hydrate a client before its first request.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Loads the last persisted token, if any.
	fn load(&self) -> StoreFuture<'_, Option<Token>>;
}

/// Error type produced by [`TokenSink`] and [`TokenSource`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "session unavailable".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("session unavailable"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
