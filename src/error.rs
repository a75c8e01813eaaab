//! Client-level error types shared across the signer, stores, lifecycle, and dispatcher.

// self
use crate::{
	_prelude::*,
	auth::{CredentialError, TokenError},
	code::{ApiCode, ErrorCategory},
	sign::SignError,
};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request signing failed.
	#[error(transparent)]
	Signing(#[from] SignError),
	/// Remote service answered with a non-success envelope code.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, malformed payloads).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Caller-side validation rejected the request before it reached the network.
	#[error("Request rejected before dispatch: {reason}.")]
	InvalidInput {
		/// Human-readable validation failure.
		reason: String,
	},
	/// Lookup returned an empty record.
	#[error("The requested record does not exist.")]
	NotFound,
	/// The caller's deadline elapsed before another attempt could start.
	#[error("Request deadline elapsed after {attempts} attempt(s).")]
	DeadlineExceeded {
		/// Attempts performed before giving up.
		attempts: u32,
		/// Error returned by the final attempt.
		#[source]
		last: Box<Error>,
	},
}
impl Error {
	/// Builds an [`Error::InvalidInput`] from any displayable reason.
	pub fn invalid_input(reason: impl Into<String>) -> Self {
		Self::InvalidInput { reason: reason.into() }
	}

	/// Places the error in the coarse taxonomy callers branch on.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Api(err) => err.code.category(),
			Self::Transient(_) => ErrorCategory::RateLimit,
			Self::Transport(_) => ErrorCategory::Transport,
			Self::InvalidInput { .. } => ErrorCategory::ClientInput,
			Self::DeadlineExceeded { last, .. } => last.category(),
			Self::Storage(_) | Self::Config(_) | Self::Signing(_) | Self::NotFound =>
				ErrorCategory::Local,
		}
	}

	/// Returns the remote code when the error came from an envelope.
	pub fn api_code(&self) -> Option<ApiCode> {
		match self {
			Self::Api(err) => Some(err.code),
			Self::DeadlineExceeded { last, .. } => last.api_code(),
			_ => None,
		}
	}

	/// Returns the upstream Retry-After hint, when one was supplied.
	pub fn retry_after(&self) -> Option<StdDuration> {
		match self {
			Self::Transient(err) => err.retry_after(),
			_ => None,
		}
	}
}

/// Envelope code other than the success sentinels, with its normalized message.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}: {message}", code.as_i64())]
pub struct ApiError {
	/// Classified remote code.
	pub code: ApiCode,
	/// Message from the envelope, or the canned text for `code` when the envelope had none.
	pub message: String,
	/// Request identifier echoed by the remote service, if any.
	pub request_id: Option<String>,
}
impl ApiError {
	/// Classifies `raw_code` and falls back to the canned message when `message` is blank.
	pub fn new(raw_code: i64, message: impl AsRef<str>) -> Self {
		let code = ApiCode::from_code(raw_code);
		let trimmed = message.as_ref().trim();
		let message =
			if trimmed.is_empty() { code.canned_message().to_owned() } else { trimmed.to_owned() };

		Self { code, message, request_id: None }
	}

	/// Attaches the request identifier echoed by the remote service.
	pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
		self.request_id = request_id;

		self
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Application credentials failed validation.
	#[error(transparent)]
	InvalidCredential(#[from] CredentialError),
	/// Base URL could not be parsed or joined.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Resource base path must be empty or start with `/`.
	#[error("Resource path `{path}` must start with `/`.")]
	InvalidResourcePath {
		/// Offending path.
		path: String,
	},
	/// Renewal margin must lie strictly between zero and one.
	#[error("Renewal margin {value} must be greater than 0 and less than 1.")]
	InvalidRenewalMargin {
		/// Offending value.
		value: f64,
	},
	/// HTTP timeout must be positive.
	#[error("HTTP timeout must be positive.")]
	NonPositiveTimeout,
	/// Retry delays are inconsistent.
	#[error("Retry base delay {base:?} exceeds the maximum delay {max:?}.")]
	InvalidRetryPolicy {
		/// Configured base delay.
		base: StdDuration,
		/// Configured maximum delay.
		max: StdDuration,
	},
	/// Page defaults are inconsistent.
	#[error("Default page limit {default_limit} must be positive and at most {max_limit}.")]
	InvalidPageDefaults {
		/// Configured default limit.
		default_limit: u32,
		/// Configured maximum limit.
		max_limit: u32,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Transport answered HTTP 429.
	#[error("Remote service throttled the request (HTTP {status}).")]
	RateLimited {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<StdDuration>,
	},
	/// Gateway reported the service as temporarily unavailable.
	#[error("Remote service is temporarily unavailable (HTTP {status}).")]
	Unavailable {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<StdDuration>,
	},
}
impl TransientError {
	/// Returns the Retry-After hint carried by the failure.
	pub fn retry_after(&self) -> Option<StdDuration> {
		match self {
			Self::RateLimited { retry_after, .. } | Self::Unavailable { retry_after, .. } =>
				*retry_after,
		}
	}
}

/// Transport-level failures (network, IO, unparsable payloads).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client gave up waiting for the response.
	#[error("Request timed out while calling the remote service.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote service.")]
	Io(#[from] std::io::Error),
	/// Response body did not match the envelope shape.
	#[error("Remote service returned a malformed envelope (HTTP {status}).")]
	MalformedEnvelope {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Non-success HTTP status without a usable envelope.
	#[error("Remote service returned HTTP {status}: {body_preview}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// Auth endpoint returned a token payload that cannot be used.
	#[error("Auth endpoint returned an unusable token.")]
	TokenPayload(#[from] TokenError),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
