//! Token Lifecycle Manager: lazy acquisition, soft refresh, and forced re-acquisition.
//!
//! The manager keeps the current [`Token`] in memory, falls back to the
//! [`CredentialStore`] once on a cold start, and serializes every acquisition or refresh
//! behind a singleflight guard. Callers that arrive while a renewal is in flight wait for it
//! and then reuse its result instead of starting their own.
//!
//! State is derived, never stored:
//!
//! - `Unauthenticated`: no token cached.
//! - `Valid`: the token's `expires_at` lies in the future.
//! - `Expiring`: `expires_at` has passed; the next caller refreshes with the refresh token.
//! - `Invalid`: the dispatcher saw the token rejected; the next caller re-acquires in full.

mod metrics;

pub use metrics::LifecycleMetrics;

// self
use crate::{
	_prelude::*,
	auth::{RenewalMargin, Token},
	error::TransportError,
	http::ApiHttpClient,
	oauth::{AuthClient, TokenGrant},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{CredentialStore, StoreError},
};

/// Lifecycle state of the cached token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
	/// No token is cached.
	Unauthenticated,
	/// The cached token may be used.
	Valid,
	/// The cached token passed its renewal point and must be refreshed.
	Expiring,
	/// The cached token was rejected and must be re-acquired.
	Invalid,
}

#[derive(Debug, Default)]
struct TokenSlot {
	token: Option<Token>,
	invalid: bool,
	loaded: bool,
	generation: u64,
}
impl TokenSlot {
	fn state_at(&self, now: OffsetDateTime) -> TokenState {
		match &self.token {
			None => TokenState::Unauthenticated,
			Some(_) if self.invalid => TokenState::Invalid,
			Some(token) if token.is_valid_at(now) => TokenState::Valid,
			Some(_) => TokenState::Expiring,
		}
	}

	fn usable_at(&self, now: OffsetDateTime) -> Option<Token> {
		match self.state_at(now) {
			TokenState::Valid => self.token.clone(),
			_ => None,
		}
	}
}

enum Renewal {
	Acquire,
	Refresh(String),
}

/// Owns the cached token and renews it on demand.
pub struct TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	auth: AuthClient<C>,
	store: Arc<dyn CredentialStore>,
	margin: RenewalMargin,
	slot: Mutex<TokenSlot>,
	flight: AsyncMutex<()>,
	metrics: Arc<LifecycleMetrics>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a manager with an empty in-memory slot.
	pub fn new(auth: AuthClient<C>, store: Arc<dyn CredentialStore>, margin: RenewalMargin) -> Self {
		Self {
			auth,
			store,
			margin,
			slot: Mutex::new(TokenSlot::default()),
			flight: AsyncMutex::new(()),
			metrics: Arc::new(LifecycleMetrics::default()),
		}
	}

	/// Returns the shared lifecycle counters.
	pub fn metrics(&self) -> Arc<LifecycleMetrics> {
		self.metrics.clone()
	}

	/// Returns the state of the cached token right now.
	pub fn state(&self) -> TokenState {
		self.state_at(OffsetDateTime::now_utc())
	}

	/// Returns the state of the cached token at `now`.
	pub fn state_at(&self, now: OffsetDateTime) -> TokenState {
		self.slot.lock().state_at(now)
	}

	/// Returns the cached token regardless of its state.
	pub fn current(&self) -> Option<Token> {
		self.slot.lock().token.clone()
	}

	/// Marks the cached token as rejected so the next caller re-acquires in full.
	pub fn invalidate(&self) {
		let mut slot = self.slot.lock();

		if slot.token.is_some() {
			slot.invalid = true;
		}
	}

	/// Invalidates the cached token only if it still carries `access_token`.
	///
	/// Returns `false` when a concurrent renewal already replaced it.
	pub fn invalidate_if_current(&self, access_token: &str) -> bool {
		let mut slot = self.slot.lock();

		match &slot.token {
			Some(token) if token.access_token.expose() == access_token => {
				slot.invalid = true;

				true
			},
			_ => false,
		}
	}

	/// Returns a usable token, acquiring or refreshing it when needed.
	///
	/// With `force` set the token is re-acquired even if the cached one looks valid.
	pub async fn ensure_valid(&self, force: bool) -> Result<Token> {
		self.ensure_valid_at(force, OffsetDateTime::now_utc()).await
	}

	/// [`Self::ensure_valid`] evaluated against the supplied clock reading.
	pub async fn ensure_valid_at(&self, force: bool, now: OffsetDateTime) -> Result<Token> {
		let seen_generation = {
			let slot = self.slot.lock();

			if let Some(token) = slot.usable_at(now).filter(|_| !force) {
				self.metrics.record_cache_hit();

				return Ok(token);
			}

			slot.generation
		};
		let _singleflight = self.flight.lock().await;

		self.load_once().await;

		let renewal = {
			let slot = self.slot.lock();
			let renewed_meanwhile = slot.generation != seen_generation;

			if let Some(token) = slot.usable_at(now).filter(|_| !force || renewed_meanwhile) {
				self.metrics.record_cache_hit();

				return Ok(token);
			}

			match (&slot.token, slot.state_at(now)) {
				(Some(token), TokenState::Expiring) if !force && token.can_refresh() =>
					Renewal::Refresh(token.refresh_token.expose().to_owned()),
				_ => Renewal::Acquire,
			}
		};

		self.renew(renewal, now).await
	}

	async fn load_once(&self) {
		if self.slot.lock().loaded {
			return;
		}

		let loaded = match self.store.load().await {
			Ok(token) => Some(token),
			Err(StoreError::NotFound) => None,
			Err(e) => {
				obs::event!(warn, error = %e, "Token cache could not be read; acquiring a new token.");

				None
			},
		};
		let mut slot = self.slot.lock();

		if !slot.loaded {
			slot.loaded = true;

			if slot.token.is_none() {
				slot.token = loaded;
			}
		}
	}

	async fn renew(&self, renewal: Renewal, now: OffsetDateTime) -> Result<Token> {
		let (kind, stage) = match renewal {
			Renewal::Acquire => (OpKind::Acquire, "acquire"),
			Renewal::Refresh(_) => (OpKind::Refresh, "refresh"),
		};
		let span = OpSpan::new(kind, stage);

		obs::record_op_outcome(kind, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let grant = match &renewal {
					Renewal::Acquire => self.auth.get_token().await,
					Renewal::Refresh(refresh_token) => self.auth.refresh_token(refresh_token).await,
				}?;

				self.install(grant, now).await
			})
			.await;

		match &result {
			Ok(_) => {
				match kind {
					OpKind::Refresh => self.metrics.record_refresh(),
					_ => self.metrics.record_acquisition(),
				}

				obs::record_op_outcome(kind, OpOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_failure();

				obs::record_op_outcome(kind, OpOutcome::Failure);
			},
		}

		result
	}

	async fn install(&self, grant: TokenGrant, now: OffsetDateTime) -> Result<Token> {
		let token =
			Token::issue(grant.access_token, grant.refresh_token, grant.expires_in, self.margin, now)
				.map_err(TransportError::from)?;

		{
			let mut slot = self.slot.lock();

			slot.token = Some(token.clone());
			slot.invalid = false;
			slot.loaded = true;
			slot.generation += 1;
		}

		if let Err(e) = self.store.save(token.clone()).await {
			obs::event!(warn, error = %e, "Token cache could not be written; keeping the token in memory.");
		}

		Ok(token)
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("margin", &self.margin)
			.field("state", &self.state())
			.finish()
	}
}
