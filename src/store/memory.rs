//! In-process token store for demos and tests.

// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{StoreError, StoreFuture, TokenSink, TokenSource},
};

/// Keeps the latest token in memory and remembers every token it was handed.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
	history: Mutex<Vec<Token>>,
	fail_with: Mutex<Option<StoreError>>,
}
impl MemoryTokenStore {
	/// Creates a store pre-seeded with a token, as if a previous session persisted it.
	pub fn with_token(token: Token) -> Self {
		Self { history: Mutex::new(vec![token]), fail_with: Mutex::default() }
	}

	/// Makes every subsequent [`TokenSink::store`] call fail with `error`.
	pub fn fail_stores_with(&self, error: StoreError) {
		*self.fail_with.lock() = Some(error);
	}

	/// Latest stored token.
	pub fn latest(&self) -> Option<Token> {
		self.history.lock().last().cloned()
	}

	/// Every token stored so far, oldest first.
	pub fn stored(&self) -> Vec<Token> {
		self.history.lock().clone()
	}

	/// Number of tokens stored so far.
	pub fn saves(&self) -> usize {
		self.history.lock().len()
	}
}
impl TokenSink for MemoryTokenStore {
	fn store<'a>(&'a self, token: &'a Token) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if let Some(error) = self.fail_with.lock().clone() {
				return Err(error);
			}

			self.history.lock().push(token.clone());

			Ok(())
		})
	}
}
impl TokenSource for MemoryTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<Token>> {
		Box::pin(async move { Ok(self.latest()) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn store_then_load_returns_latest() {
		let store = MemoryTokenStore::default();
		let first = Token::new("a1", "r1", OffsetDateTime::UNIX_EPOCH);
		let second = Token::new("a2", "r1", OffsetDateTime::UNIX_EPOCH);

		assert_eq!(store.load().await.expect("Empty store should load."), None);

		store.store(&first).await.expect("First store should succeed.");
		store.store(&second).await.expect("Second store should succeed.");

		assert_eq!(store.load().await.expect("Store should load."), Some(second));
		assert_eq!(store.saves(), 2);
	}

	#[tokio::test]
	async fn injected_failure_is_returned() {
		let store = MemoryTokenStore::default();

		store.fail_stores_with(StoreError::Backend { message: "full".into() });

		let err = store
			.store(&Token::new("a", "r", OffsetDateTime::UNIX_EPOCH))
			.await
			.expect_err("Injected failure should surface.");

		assert_eq!(err, StoreError::Backend { message: "full".into() });
		assert_eq!(store.saves(), 0);
	}
}
