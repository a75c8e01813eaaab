//! Remote envelope codes and the taxonomy they classify into.
//!
//! The remote service reports failures through a numeric `code` inside an otherwise
//! successful HTTP response. [`ApiCode`] names the documented values, supplies the
//! canned message used when the envelope carries none, and places each code in an
//! [`ErrorCategory`] so the dispatcher can decide between retrying and surfacing.

// self
use crate::_prelude::*;

/// Coarse error categories callers can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// App id/secret, access/refresh token, or signature problems.
	Credential,
	/// Request rejected because of caller-supplied input.
	ClientInput,
	/// Throttling (HTTP 429 or a throttling code).
	RateLimit,
	/// Remote-side failure with no evidence of being transient.
	Service,
	/// Network failures and malformed payloads.
	Transport,
	/// Local failures (storage, configuration, signing, empty lookups).
	Local,
}
impl ErrorCategory {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Credential => "credential",
			Self::ClientInput => "client_input",
			Self::RateLimit => "rate_limit",
			Self::Service => "service",
			Self::Transport => "transport",
			Self::Local => "local",
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Documented envelope codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiCode {
	/// `2001001`: the app id does not exist.
	AppIdNotFound,
	/// `2001002`: the app secret is wrong or was not URL-encoded.
	InvalidAppSecret,
	/// `2001003`: the access token is missing or expired.
	AccessTokenExpired,
	/// `2001004`: the API is not authorized for this app.
	Unauthorized,
	/// `2001005`: the access token is malformed.
	InvalidAccessToken,
	/// `2001006`: the signature does not match.
	InvalidSignature,
	/// `2001007`: the signature timestamp is too old.
	SignatureExpired,
	/// `2001008`: the refresh token expired.
	RefreshTokenExpired,
	/// `2001009`: the refresh token is invalid.
	InvalidRefreshToken,
	/// `3001001`: required query parameters are missing.
	MissingQueryParams,
	/// `3001002`: the caller IP is not whitelisted.
	IpNotWhitelisted,
	/// `3001008`: the request quota was exceeded.
	QuotaExceeded,
	/// `103`: business-level throttling.
	BusinessThrottled,
	/// Any other non-success code.
	Unknown(i64),
}
impl ApiCode {
	/// Success sentinel used by resource endpoints.
	pub const OK: i64 = 0;
	/// Success sentinel used by the auth endpoints.
	pub const OK_HTTP: i64 = 200;

	/// Returns `true` when `code` is one of the success sentinels.
	pub const fn is_success(code: i64) -> bool {
		code == Self::OK || code == Self::OK_HTTP
	}

	/// Classifies a raw envelope code.
	pub const fn from_code(code: i64) -> Self {
		match code {
			2001001 => Self::AppIdNotFound,
			2001002 => Self::InvalidAppSecret,
			2001003 => Self::AccessTokenExpired,
			2001004 => Self::Unauthorized,
			2001005 => Self::InvalidAccessToken,
			2001006 => Self::InvalidSignature,
			2001007 => Self::SignatureExpired,
			2001008 => Self::RefreshTokenExpired,
			2001009 => Self::InvalidRefreshToken,
			3001001 => Self::MissingQueryParams,
			3001002 => Self::IpNotWhitelisted,
			3001008 => Self::QuotaExceeded,
			103 => Self::BusinessThrottled,
			other => Self::Unknown(other),
		}
	}

	/// Returns the raw numeric code.
	pub const fn as_i64(self) -> i64 {
		match self {
			Self::AppIdNotFound => 2001001,
			Self::InvalidAppSecret => 2001002,
			Self::AccessTokenExpired => 2001003,
			Self::Unauthorized => 2001004,
			Self::InvalidAccessToken => 2001005,
			Self::InvalidSignature => 2001006,
			Self::SignatureExpired => 2001007,
			Self::RefreshTokenExpired => 2001008,
			Self::InvalidRefreshToken => 2001009,
			Self::MissingQueryParams => 3001001,
			Self::IpNotWhitelisted => 3001002,
			Self::QuotaExceeded => 3001008,
			Self::BusinessThrottled => 103,
			Self::Unknown(code) => code,
		}
	}

	/// Message used when the envelope carries an empty one.
	pub const fn canned_message(self) -> &'static str {
		match self {
			Self::AppIdNotFound => "app id does not exist",
			Self::InvalidAppSecret => "app secret is incorrect or was not URL-encoded",
			Self::AccessTokenExpired => "access token does not exist or has expired",
			Self::Unauthorized => "API is not authorized",
			Self::InvalidAccessToken => "access token is incorrect",
			Self::InvalidSignature => "signature is incorrect",
			Self::SignatureExpired => "signature has expired",
			Self::RefreshTokenExpired => "refresh token has expired",
			Self::InvalidRefreshToken => "refresh token is invalid",
			Self::MissingQueryParams => "required query parameters are missing",
			Self::IpNotWhitelisted => "IP address is not whitelisted",
			Self::QuotaExceeded => "request quota exceeded",
			Self::BusinessThrottled => "requests are being throttled, try again later",
			Self::Unknown(_) => "unknown error",
		}
	}

	/// Places the code in the coarse taxonomy.
	pub const fn category(self) -> ErrorCategory {
		match self {
			Self::AppIdNotFound
			| Self::InvalidAppSecret
			| Self::AccessTokenExpired
			| Self::Unauthorized
			| Self::InvalidAccessToken
			| Self::InvalidSignature
			| Self::SignatureExpired
			| Self::RefreshTokenExpired
			| Self::InvalidRefreshToken
			| Self::IpNotWhitelisted => ErrorCategory::Credential,
			Self::MissingQueryParams => ErrorCategory::ClientInput,
			Self::QuotaExceeded | Self::BusinessThrottled => ErrorCategory::RateLimit,
			Self::Unknown(_) => ErrorCategory::Service,
		}
	}

	/// Returns `true` when the code means the access token must not be reused.
	pub const fn rejects_access_token(self) -> bool {
		matches!(self, Self::AccessTokenExpired | Self::InvalidAccessToken)
	}

	/// Returns `true` when the code means the refresh token is no longer usable.
	pub const fn rejects_refresh_token(self) -> bool {
		matches!(self, Self::RefreshTokenExpired | Self::InvalidRefreshToken)
	}

	/// Returns `true` for throttling codes.
	pub const fn is_throttle(self) -> bool {
		matches!(self, Self::QuotaExceeded | Self::BusinessThrottled)
	}
}
impl Display for ApiCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.as_i64())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn codes_round_trip_through_classification() {
		for raw in [
			2001001, 2001002, 2001003, 2001004, 2001005, 2001006, 2001007, 2001008, 2001009,
			3001001, 3001002, 3001008, 103, 42,
		] {
			assert_eq!(ApiCode::from_code(raw).as_i64(), raw);
		}
	}

	#[test]
	fn success_sentinels() {
		assert!(ApiCode::is_success(0));
		assert!(ApiCode::is_success(200));
		assert!(!ApiCode::is_success(2001003));
	}

	#[test]
	fn token_rejection_flags() {
		assert!(ApiCode::AccessTokenExpired.rejects_access_token());
		assert!(ApiCode::InvalidAccessToken.rejects_access_token());
		assert!(!ApiCode::InvalidSignature.rejects_access_token());
		assert!(ApiCode::RefreshTokenExpired.rejects_refresh_token());
		assert!(ApiCode::InvalidRefreshToken.rejects_refresh_token());
		assert_eq!(ApiCode::Unknown(500).canned_message(), "unknown error");
		assert_eq!(ApiCode::Unknown(500).category(), ErrorCategory::Service);
	}
}
