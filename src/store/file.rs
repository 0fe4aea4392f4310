//! JSON-file token store for CLIs and long-running bots.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{StoreError, StoreFuture, TokenSink, TokenSource},
};

/// Persists the current token as a single JSON document, replaced atomically on every store.
#[derive(Debug)]
pub struct FileTokenStore {
	path: PathBuf,
	write_lock: Mutex<()>,
}
impl FileTokenStore {
	/// Targets `path`; the file is created on the first store.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), write_lock: Mutex::default() }
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(&self) -> Result<Option<Token>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => {
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				});
			},
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn write_now(&self, token: &Token) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		let serialized = serde_json::to_vec_pretty(token).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to serialize token: {e}") }
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenSink for FileTokenStore {
	fn store<'a>(&'a self, token: &'a Token) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.write_now(token) })
	}
}
impl TokenSource for FileTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<Token>> {
		Box::pin(async move { self.read_now() })
	}
}
