//! Transport seam shared by the auth sub-client and the request dispatcher.
//!
//! [`ApiHttpClient`] is the client's only dependency on an HTTP stack. Requests are fully
//! built (URL with signed query, headers, JSON body) before they reach the transport, and
//! responses come back as raw bytes plus the status and Retry-After hint the dispatcher
//! needs for classification.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Response body bytes kept when previewing payloads in errors and debug logs.
pub const BODY_PREVIEW_LIMIT: usize = 256;

/// HTTP verbs used by the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
}
impl HttpMethod {
	/// Returns the verb as an uppercase string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully prepared outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Verb.
	pub method: HttpMethod,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Headers added on top of the transport defaults.
	pub headers: Vec<(&'static str, String)>,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Builds a request carrying the JSON `Accept`/`Content-Type` headers.
	pub fn json(method: HttpMethod, url: Url, body: Option<Vec<u8>>) -> Self {
		Self {
			method,
			url,
			headers: vec![
				("accept", "application/json".into()),
				("content-type", "application/json".into()),
			],
			body,
		}
	}

	/// Returns the first query value named `key`.
	pub fn query_value(&self, key: &str) -> Option<String> {
		self.url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
	}

	/// Parses the body as JSON.
	pub fn json_body(&self) -> Option<Value> {
		self.body.as_deref().and_then(|raw| serde_json::from_slice(raw).ok())
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<StdDuration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Lossy UTF-8 preview of the body, truncated to [`BODY_PREVIEW_LIMIT`] characters.
	pub fn body_preview(&self) -> String {
		let text = String::from_utf8_lossy(&self.body);
		let mut preview: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();

		if text.chars().count() > BODY_PREVIEW_LIMIT {
			preview.push('…');
		}

		preview
	}
}

/// Future returned by [`ApiHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// auth sub-client, the lifecycle manager, and every in-flight request.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response; non-2xx statuses are not errors here.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects are not followed: both the auth and resource endpoints answer directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the given request timeout and user agent.
	pub fn build(timeout: StdDuration, user_agent: &str) -> Result<Self, ReqwestError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.user_agent(user_agent)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
			};
			let mut builder = self.0.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<StdDuration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(StdDuration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return StdDuration::try_from(delta).ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn body_preview_truncates_long_payloads() {
		let response =
			HttpResponse { status: 500, retry_after: None, body: "x".repeat(300).into_bytes() };
		let preview = response.body_preview();

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
		assert!(!response.is_success());
	}

	#[test]
	fn json_requests_carry_content_headers() {
		let url = Url::parse("https://openapi.lingxing.com/erp/sc/x?sign=a%2Bb")
			.expect("Fixture URL should parse.");
		let request = HttpRequest::json(HttpMethod::Post, url, Some(b"{\"a\":1}".to_vec()));

		assert_eq!(request.query_value("sign").as_deref(), Some("a+b"));
		assert_eq!(request.json_body(), Some(serde_json::json!({ "a": 1 })));
		assert!(request.headers.iter().any(|(k, v)| *k == "content-type" && v == "application/json"));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "7".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(StdDuration::from_secs(7)));
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}
}
