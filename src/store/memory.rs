//! In-process [`CredentialStore`] for tests and short-lived tools.

// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Keeps the token in memory; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<Token>>>);
impl MemoryStore {
	/// Creates a store pre-seeded with `token`.
	pub fn with_token(token: Token) -> Self {
		Self(Arc::new(RwLock::new(Some(token))))
	}

	/// Returns the stored token without going through the async contract.
	pub fn snapshot(&self) -> Option<Token> {
		self.0.read().clone()
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Token> {
		let slot = self.0.clone();

		Box::pin(async move { slot.read().clone().ok_or(StoreError::NotFound) })
	}

	fn save(&self, token: Token) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(token);

			Ok(())
		})
	}
}
