//! JSON file-backed [`CredentialStore`] living at a well-known path.

// std
use std::{
	env,
	fs::{self, File, OpenOptions},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	obs,
	store::{CredentialStore, StoreError, StoreFuture},
};

/// File name used under the system temp directory by [`FileStore::at_default_path`].
pub const DEFAULT_FILE_NAME: &str = "lingxing_token.json";

/// Persists the current token as a single JSON document.
///
/// Writes go to a sibling temp file that is synced and then renamed over the target, so a
/// failed save never leaves a truncated cache behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens a store at `path`, creating parent directories as needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_lock: Arc::new(Mutex::new(())) })
	}

	/// Opens the store at [`FileStore::default_path`].
	pub fn at_default_path() -> Result<Self, StoreError> {
		Self::open(Self::default_path())
	}

	/// Well-known cache location: `<temp dir>/lingxing_token.json`.
	pub fn default_path() -> PathBuf {
		env::temp_dir().join(DEFAULT_FILE_NAME)
	}

	/// Returns the cache file location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn load_now(&self) -> Result<Token, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Err(StoreError::NotFound);
		}

		serde_json::from_slice(&bytes).map_err(|e| {
			obs::event!(
				warn,
				path = %self.path.display(),
				error = %e,
				"Ignoring corrupt token cache."
			);

			StoreError::NotFound
		})
	}

	fn persist_now(&self, token: &Token) -> Result<(), StoreError> {
		let serialized = serde_json::to_vec(token).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize token: {e}"),
		})?;
		let _guard = self.write_lock.lock();

		Self::ensure_parent_exists(&self.path)?;

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		let written = Self::write_synced(&tmp_path, &serialized)
			.and_then(|()| fs::rename(&tmp_path, &self.path));

		written.map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend { message: format!("Failed to replace {}: {e}", self.path.display()) }
		})
	}

	fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
		let mut options = OpenOptions::new();

		options.write(true).create(true).truncate(true);

		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;

			options.mode(0o600);
		}

		let mut file: File = options.open(path)?;

		file.write_all(bytes)?;
		file.sync_all()
	}
}
impl CredentialStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Token> {
		Box::pin(async move { self.load_now() })
	}

	fn save(&self, token: Token) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.persist_now(&token) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::process;
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::RenewalMargin;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"lingxing_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn token() -> Token {
		Token::issue("access-token", "refresh-token", 7200, RenewalMargin::HALF, OffsetDateTime::now_utc())
			.expect("Token fixture should build.")
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let store = FileStore::open(&path).expect("Failed to open file store.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let token = token();

		assert_eq!(rt.block_on(store.load()), Err(StoreError::NotFound));

		rt.block_on(store.save(token.clone())).expect("Failed to save fixture token.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");
		let loaded = rt.block_on(reopened.load()).expect("File store lost the token after reopen.");

		assert_eq!(loaded, token);
		assert!(!path.with_extension("tmp").exists());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary token cache {}: {e}", path.display())
		});
	}

	#[test]
	fn empty_or_corrupt_cache_reads_as_not_found() {
		let path = temp_path("corrupt");
		let store = FileStore::open(&path).expect("Failed to open file store.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		fs::write(&path, b"").expect("Failed to write empty cache.");

		assert_eq!(rt.block_on(store.load()), Err(StoreError::NotFound));

		fs::write(&path, b"{\"access_token\":").expect("Failed to write corrupt cache.");

		assert_eq!(rt.block_on(store.load()), Err(StoreError::NotFound));

		rt.block_on(store.save(token())).expect("Save should replace a corrupt cache.");

		assert!(rt.block_on(store.load()).is_ok());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary token cache {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_save_keeps_previous_cache_intact() {
		let dir = temp_path("blocked");
		let path = dir.join("token.json");
		let store = FileStore::open(&path).expect("Failed to open file store.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let first = token();

		rt.block_on(store.save(first.clone())).expect("Initial save should succeed.");
		// A directory squatting on the temp path makes the next write fail before the rename.
		fs::create_dir(path.with_extension("tmp")).expect("Failed to block the temp path.");

		assert!(matches!(rt.block_on(store.save(token())), Err(StoreError::Backend { .. })));
		assert_eq!(rt.block_on(store.load()).expect("Previous cache should survive."), first);

		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store directory {}: {e}", dir.display())
		});
	}
}
