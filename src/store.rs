//! Credential Store contract and the built-in file and memory backends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Token};

/// Future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable cache of the current [`Token`].
///
/// A missing or unreadable cache is reported as [`StoreError::NotFound`]; the lifecycle
/// manager treats that as "acquire a new token", never as a fatal error.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Loads the cached token.
	fn load(&self) -> StoreFuture<'_, Token>;

	/// Replaces the cached token wholesale.
	fn save(&self, token: Token) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// No usable token is cached.
	#[error("No cached token was found.")]
	NotFound,
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
impl StoreError {
	/// Returns `true` for the "must acquire" sentinel.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk full"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
		assert!(StoreError::NotFound.is_not_found());
		assert!(!store_error.is_not_found());
	}
}
