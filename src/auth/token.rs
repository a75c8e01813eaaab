//! Access/refresh token pair, its renewal margin, and validity checks.

pub mod secret;

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ConfigError};

/// Errors produced while turning an auth endpoint payload into a [`Token`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenError {
	/// Issued when the payload carries no access token value.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when `expires_in` is zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Issued when `expires_in` overflows the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Fraction `k` of the server-advertised lifetime a token is trusted for.
///
/// Renewal happens once `now` crosses `issued + expires_in * k`, ahead of the server's own
/// invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RenewalMargin(f64);
impl RenewalMargin {
	/// Renew once half of the advertised lifetime has elapsed.
	pub const HALF: Self = Self(0.5);

	/// Validates `0 < value < 1`.
	pub fn new(value: f64) -> Result<Self, ConfigError> {
		if value > 0. && value < 1. {
			Ok(Self(value))
		} else {
			Err(ConfigError::InvalidRenewalMargin { value })
		}
	}

	/// Returns the fraction.
	pub fn get(self) -> f64 {
		self.0
	}

	/// Scales a server-advertised lifetime by the margin.
	pub fn apply(self, expires_in: Duration) -> Duration {
		expires_in * self.0
	}
}
impl Default for RenewalMargin {
	fn default() -> Self {
		Self::HALF
	}
}
impl TryFrom<f64> for RenewalMargin {
	type Error = ConfigError;

	fn try_from(value: f64) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<RenewalMargin> for f64 {
	fn from(value: RenewalMargin) -> Self {
		value.0
	}
}

/// Current access/refresh token pair, persisted verbatim by credential stores.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token attached to every signed request.
	pub access_token: TokenSecret,
	/// Refresh token used to obtain a new access token.
	pub refresh_token: TokenSecret,
	/// Lifetime advertised by the auth endpoint, in seconds.
	pub expires_in: i64,
	/// Instant after which the token is no longer trusted locally.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Builds a token acquired at `now`, trusting it for `expires_in * margin` seconds.
	pub fn issue(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in: i64,
		margin: RenewalMargin,
		now: OffsetDateTime,
	) -> Result<Self, TokenError> {
		let access_token = TokenSecret::new(access_token);

		if access_token.is_empty() {
			return Err(TokenError::MissingAccessToken);
		}
		if expires_in <= 0 {
			return Err(TokenError::NonPositiveExpiresIn);
		}

		let lifetime = margin.apply(Duration::seconds(expires_in));
		// Whole seconds only: the cache persists unix seconds, and flooring keeps renewal early.
		let expires_at = now
			.checked_add(lifetime)
			.and_then(|at| at.replace_nanosecond(0).ok())
			.ok_or(TokenError::ExpiresInOutOfRange)?;

		Ok(Self {
			access_token,
			refresh_token: TokenSecret::new(refresh_token),
			expires_in,
			expires_at,
		})
	}

	/// Returns `true` if the token may be used at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		!self.access_token.is_empty() && self.expires_at > instant
	}

	/// Checks validity against the current UTC clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if a refresh token is available.
	pub fn can_refresh(&self) -> bool {
		!self.refresh_token.is_empty()
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn issue_applies_renewal_margin() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token::issue("access", "refresh", 3600, RenewalMargin::HALF, now)
			.expect("Token fixture should build.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:30 UTC));
		assert!(token.is_valid_at(now + Duration::seconds(1799)));
		assert!(!token.is_valid_at(now + Duration::seconds(1800)));
		assert!(!token.is_valid_at(now + Duration::seconds(1801)));

		let margin = RenewalMargin::new(0.8).expect("0.8 should be an accepted margin.");
		let token = Token::issue("access", "refresh", 3600, margin, now)
			.expect("Token fixture should build.");

		assert_eq!(token.expires_at, now + Duration::seconds(2880));
	}

	#[test]
	fn empty_access_token_is_never_valid() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token {
			access_token: TokenSecret::new(""),
			refresh_token: TokenSecret::new("refresh"),
			expires_in: 3600,
			expires_at: now + Duration::days(365),
		};

		assert!(!token.is_valid_at(now));
		assert_eq!(
			Token::issue("", "refresh", 3600, RenewalMargin::HALF, now),
			Err(TokenError::MissingAccessToken)
		);
		assert_eq!(
			Token::issue("access", "refresh", 0, RenewalMargin::HALF, now),
			Err(TokenError::NonPositiveExpiresIn)
		);
	}

	#[test]
	fn margin_bounds_are_exclusive() {
		assert!(RenewalMargin::new(0.).is_err());
		assert!(RenewalMargin::new(1.).is_err());
		assert!(RenewalMargin::new(f64::NAN).is_err());
		assert!(RenewalMargin::new(0.5).is_ok());
	}

	#[test]
	fn serializes_entity_fields_verbatim() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token::issue("access", "refresh", 7200, RenewalMargin::HALF, now)
			.expect("Token fixture should build.");
		let json = serde_json::to_value(&token).expect("Token should serialize.");

		assert_eq!(
			json,
			serde_json::json!({
				"access_token": "access",
				"refresh_token": "refresh",
				"expires_in": 7200,
				"expires_at": now.unix_timestamp() + 3600,
			})
		);
		assert_eq!(format!("{token:?}").matches("<redacted>").count(), 2);
	}

	#[test]
	fn expiry_is_floored_to_whole_seconds_and_survives_persistence() {
		let now = macros::datetime!(2025-01-01 00:00:00.750 UTC);
		let token = Token::issue("access", "refresh", 7199, RenewalMargin::HALF, now)
			.expect("Token fixture should build.");

		// 00:00:00.750 + 3599.5 s = 01:00:00.250, floored to 01:00:00.
		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 01:00 UTC));

		let json = serde_json::to_string(&token).expect("Token should serialize.");
		let reloaded: Token = serde_json::from_str(&json).expect("Token should deserialize.");

		assert_eq!(reloaded, token);
	}
}
