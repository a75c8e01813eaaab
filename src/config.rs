//! Client configuration: credentials, endpoint selection, timeouts, and pipeline policies.

pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret, RenewalMargin},
	dispatch::RetryPolicy,
	page::PageDefaults,
};

/// Resource base path used by the ERP endpoints.
pub const DEFAULT_RESOURCE_PATH: &str = "/erp/sc";
/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("lingxing-client/", env!("CARGO_PKG_VERSION"));

/// Remote deployment targeted by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Live tenant data.
	#[default]
	Production,
	/// Vendor-provided sandbox.
	Sandbox,
}
impl Environment {
	/// Host serving both the auth and resource endpoints.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Production => "https://openapi.lingxing.com",
			Self::Sandbox => "https://openapisandbox.lingxing.com",
		}
	}
}

/// Validated client configuration; build one with [`ClientConfig::builder`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Application id; also the signing key.
	pub app_id: AppId,
	/// Application secret exchanged for tokens.
	pub app_secret: AppSecret,
	/// Selected deployment.
	pub environment: Environment,
	/// Effective host, either the environment's or an explicit override.
	pub base_url: Url,
	/// Base path prefixed to every resource endpoint.
	pub resource_path: String,
	/// Emits request paths, statuses, and response previews at debug level.
	pub debug: bool,
	/// Per-request HTTP timeout.
	pub timeout: StdDuration,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// Fraction of the advertised token lifetime trusted locally.
	pub renewal_margin: RenewalMargin,
	/// Retry policy for resource requests.
	pub retry: RetryPolicy,
	/// Offset/limit defaults for list endpoints.
	pub paging: PageDefaults,
}
impl ClientConfig {
	/// Starts a builder with the application credentials.
	pub fn builder(app_id: impl Into<String>, app_secret: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(app_id, app_secret)
	}

	/// Absolute URL for an auth endpoint path (served at the host root).
	pub fn auth_url(&self, path: &str) -> Url {
		join_path(&self.base_url, &[path])
	}

	/// Absolute URL for a resource endpoint path (served under [`Self::resource_path`]).
	pub fn resource_url(&self, path: &str) -> Url {
		join_path(&self.base_url, &[&self.resource_path, path])
	}
}

fn join_path(base: &Url, segments: &[&str]) -> Url {
	let mut path = base.path().trim_end_matches('/').to_owned();

	for segment in segments {
		let segment = segment.trim_end_matches('/');

		if segment.is_empty() {
			continue;
		}
		if !segment.starts_with('/') {
			path.push('/');
		}

		path.push_str(segment);
	}

	if path.is_empty() {
		path.push('/');
	}

	let mut url = base.clone();

	url.set_path(&path);
	url.set_query(None);
	url.set_fragment(None);

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(base: Option<&str>) -> ClientConfig {
		let mut builder = ClientConfig::builder("ak_0123456789abc", "secret");

		if let Some(base) = base {
			builder = builder.base_url(Url::parse(base).expect("Fixture URL should parse."));
		}

		builder.build().expect("Fixture config should build.")
	}

	#[test]
	fn urls_join_host_and_resource_paths() {
		let config = config(None);

		assert_eq!(
			config.auth_url("/api/auth-server/oauth/access-token").as_str(),
			"https://openapi.lingxing.com/api/auth-server/oauth/access-token"
		);
		assert_eq!(
			config.resource_url("/data/seller/lists").as_str(),
			"https://openapi.lingxing.com/erp/sc/data/seller/lists"
		);
	}

	#[test]
	fn override_keeps_proxy_prefix() {
		let config = config(Some("http://127.0.0.1:8080/proxy/"));

		assert_eq!(
			config.resource_url("/routing/order").as_str(),
			"http://127.0.0.1:8080/proxy/erp/sc/routing/order"
		);
	}
}
