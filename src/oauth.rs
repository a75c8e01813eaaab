//! Unauthenticated sub-client for the token endpoints.
//!
//! The remote service exposes a token exchange that is not RFC 6749 compliant: the app id and
//! secret travel in the query string of a `POST`, and the grant comes back wrapped in the same
//! `{code, msg, data}` envelope as resource responses. Failures are surfaced unchanged; retrying
//! is the dispatcher's call.

// self
use crate::{
	_prelude::*,
	auth::TokenError,
	config::ClientConfig,
	dispatch::{DetailFormat, interpret},
	error::TransportError,
	http::{ApiHttpClient, HttpMethod, HttpRequest},
	lenient, obs,
};

/// Token acquisition path (served at the host root).
pub const ACCESS_TOKEN_PATH: &str = "/api/auth-server/oauth/access-token";
/// Token refresh path (served at the host root).
pub const REFRESH_TOKEN_PATH: &str = "/api/auth-server/oauth/refresh";

/// Token pair returned by either auth endpoint.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
	/// New access token.
	pub access_token: String,
	/// New refresh token.
	#[serde(default)]
	pub refresh_token: String,
	/// Advertised lifetime in seconds.
	#[serde(with = "lenient::int")]
	pub expires_in: i64,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Calls the token endpoints with the configured application credentials.
pub struct AuthClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	config: Arc<ClientConfig>,
	format: DetailFormat,
}
impl<C> AuthClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a sub-client sharing `http_client` with the dispatcher.
	pub fn new(http_client: Arc<C>, config: Arc<ClientConfig>) -> Self {
		Self { http_client, config, format: DetailFormat::default() }
	}

	/// Exchanges the app id and secret for a new token pair.
	pub async fn get_token(&self) -> Result<TokenGrant> {
		let mut url = self.config.auth_url(ACCESS_TOKEN_PATH);

		url.query_pairs_mut()
			.append_pair("appId", self.config.app_id.expose())
			.append_pair("appSecret", self.config.app_secret.expose());

		self.exchange(url, ACCESS_TOKEN_PATH).await
	}

	/// Exchanges `refresh_token` for a new token pair.
	pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
		let mut url = self.config.auth_url(REFRESH_TOKEN_PATH);

		url.query_pairs_mut()
			.append_pair("appId", self.config.app_id.expose())
			.append_pair("refreshToken", refresh_token);

		self.exchange(url, REFRESH_TOKEN_PATH).await
	}

	async fn exchange(&self, url: Url, path: &'static str) -> Result<TokenGrant> {
		let response =
			self.http_client.execute(HttpRequest::json(HttpMethod::Post, url, None)).await?;

		if self.config.debug {
			obs::event!(debug, path, status = response.status, "Auth endpoint responded.");
		}

		let envelope = interpret(&response, &self.format)?;
		let grant = envelope.decode::<TokenGrant>()?;

		if grant.access_token.is_empty() {
			return Err(TransportError::TokenPayload(TokenError::MissingAccessToken).into());
		}

		Ok(grant)
	}
}
impl<C> Debug for AuthClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient").field("base_url", &self.config.base_url.as_str()).finish()
	}
}
