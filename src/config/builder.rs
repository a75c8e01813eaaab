//! Validating builder for [`ClientConfig`].

// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret, RenewalMargin},
	config::{
		ClientConfig, DEFAULT_RESOURCE_PATH, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, Environment,
	},
	dispatch::RetryPolicy,
	error::ConfigError,
	page::PageDefaults,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Raw application id, validated at build time.
	pub app_id: String,
	/// Raw application secret, validated at build time.
	pub app_secret: String,
	/// Selected deployment.
	pub environment: Environment,
	/// Host override; takes precedence over [`Self::environment`].
	pub base_url: Option<Url>,
	/// Base path for resource endpoints.
	pub resource_path: String,
	/// Debug logging toggle.
	pub debug: bool,
	/// Per-request HTTP timeout.
	pub timeout: StdDuration,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// Token renewal margin as a raw fraction.
	pub renewal_margin: f64,
	/// Retry policy for resource requests.
	pub retry: RetryPolicy,
	/// Offset/limit defaults for list endpoints.
	pub paging: PageDefaults,
}
impl ClientConfigBuilder {
	/// Creates a builder with production defaults.
	pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			app_secret: app_secret.into(),
			environment: Environment::default(),
			base_url: None,
			resource_path: DEFAULT_RESOURCE_PATH.into(),
			debug: false,
			timeout: DEFAULT_TIMEOUT,
			user_agent: DEFAULT_USER_AGENT.into(),
			renewal_margin: RenewalMargin::default().get(),
			retry: RetryPolicy::default(),
			paging: PageDefaults::default(),
		}
	}

	/// Selects the deployment.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Shortcut for toggling between [`Environment::Sandbox`] and [`Environment::Production`].
	pub fn sandbox(self, enabled: bool) -> Self {
		self.environment(if enabled { Environment::Sandbox } else { Environment::Production })
	}

	/// Points the client at an explicit host (proxies, mock servers).
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the resource base path.
	pub fn resource_path(mut self, path: impl Into<String>) -> Self {
		self.resource_path = path.into();

		self
	}

	/// Enables debug-level request tracing.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;

		self
	}

	/// Overrides the per-request HTTP timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Overrides the token renewal margin (`0 < k < 1`).
	pub fn renewal_margin(mut self, margin: f64) -> Self {
		self.renewal_margin = margin;

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the pagination defaults.
	pub fn paging(mut self, paging: PageDefaults) -> Self {
		self.paging = paging;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let app_id = AppId::new(&self.app_id)?;
		let app_secret = AppSecret::new(&self.app_secret)?;
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(self.environment.base_url())
				.map_err(|source| ConfigError::InvalidBaseUrl { source })?,
		};

		validate_base_url(&base_url)?;

		let resource_path = self.resource_path.trim_end_matches('/').to_owned();

		if !resource_path.is_empty() && !resource_path.starts_with('/') {
			return Err(ConfigError::InvalidResourcePath { path: self.resource_path });
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		let renewal_margin = RenewalMargin::new(self.renewal_margin)?;

		self.retry.validate()?;
		self.paging.validate()?;

		Ok(ClientConfig {
			app_id,
			app_secret,
			environment: self.environment,
			base_url,
			resource_path,
			debug: self.debug,
			timeout: self.timeout,
			user_agent: self.user_agent,
			renewal_margin,
			retry: self.retry,
			paging: self.paging,
		})
	}
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint: "base", url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
