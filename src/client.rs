//! Client facade tying the signer, token manager, dispatcher, and pagination together.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	dispatch::DetailFormat,
	http::ApiHttpClient,
	lifecycle::TokenManager,
	oauth::AuthClient,
	page::PageTracker,
	sign::Signer,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, store::FileStore};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestHttpClient>;

/// Authenticated API client.
///
/// Cloning is cheap: clones share the transport, the token manager, and therefore the
/// singleflight guard, so concurrent requests from any clone never race on token renewal.
pub struct Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	pub(crate) http_client: Arc<C>,
	pub(crate) config: Arc<ClientConfig>,
	pub(crate) tokens: Arc<TokenManager<C>>,
	pub(crate) signer: Arc<Signer>,
	pub(crate) tracker: PageTracker,
	pub(crate) format: DetailFormat,
}
impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// Fails when the application id cannot key the signing cipher.
	pub fn with_http_client(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let signer = Signer::new(&config.app_id)?;
		let config = Arc::new(config);
		let auth = AuthClient::new(http_client.clone(), config.clone());
		let tokens = TokenManager::new(auth, store, config.renewal_margin);

		Ok(Self {
			http_client,
			tracker: PageTracker::new(config.paging),
			config,
			tokens: Arc::new(tokens),
			signer: Arc::new(signer),
			format: DetailFormat::default(),
		})
	}

	/// Replaces the boilerplate stripped from error details.
	pub fn with_detail_format(mut self, format: DetailFormat) -> Self {
		self.format = format;

		self
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the token manager shared by every clone of this client.
	pub fn tokens(&self) -> &TokenManager<C> {
		&self.tokens
	}

	/// Returns the request signer.
	pub fn signer(&self) -> &Signer {
		&self.signer
	}

	/// Returns the pagination arithmetic bound to the configured page defaults.
	pub fn pages(&self) -> PageTracker {
		self.tracker
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client with its own reqwest transport using the configured timeout and
	/// user agent.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		let transport = ReqwestHttpClient::build(config.timeout, &config.user_agent)
			.map_err(ConfigError::from)?;

		Self::with_http_client(config, store, transport)
	}

	/// Creates a client persisting tokens to the default cache file.
	pub fn with_file_store(config: ClientConfig) -> Result<Self> {
		let store = FileStore::at_default_path()?;

		Self::new(config, Arc::new(store))
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			tokens: self.tokens.clone(),
			signer: self.signer.clone(),
			tracker: self.tracker,
			format: self.format.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("base_url", &self.config.base_url.as_str())
			.field("resource_path", &self.config.resource_path)
			.field("tokens", &self.tokens)
			.finish()
	}
}
