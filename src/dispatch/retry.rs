//! Retry policy and the retry-vs-surface classification of dispatch failures.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError},
};

/// Bounded retry settings for resource requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
	/// Additional attempts after the first one.
	pub max_retries: u32,
	/// Delay before the first retry; doubles for each further retry.
	pub base_delay: StdDuration,
	/// Upper bound for any single wait, including server Retry-After hints.
	pub max_delay: StdDuration,
	/// Draws each wait uniformly from `[delay / 2, delay]` when enabled.
	pub jitter: bool,
}
impl RetryPolicy {
	/// Never retries.
	pub const fn none() -> Self {
		Self { max_retries: 0, base_delay: StdDuration::ZERO, max_delay: StdDuration::ZERO, jitter: false }
	}

	/// Retries `max_retries` times without waiting.
	pub const fn immediate(max_retries: u32) -> Self {
		Self { max_retries, base_delay: StdDuration::ZERO, max_delay: StdDuration::ZERO, jitter: false }
	}

	/// Ensures `base_delay <= max_delay`.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.base_delay > self.max_delay {
			return Err(ConfigError::InvalidRetryPolicy { base: self.base_delay, max: self.max_delay });
		}

		Ok(())
	}

	/// Total attempts including the first one.
	pub const fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Wait before retry number `retry` (1-based).
	///
	/// A server hint replaces the computed backoff; either way the result never exceeds
	/// [`Self::max_delay`].
	pub fn delay_for(&self, retry: u32, hint: Option<StdDuration>) -> StdDuration {
		if let Some(hint) = hint {
			return hint.min(self.max_delay);
		}

		let exponent = retry.saturating_sub(1).min(16);
		let delay = self.base_delay.saturating_mul(1 << exponent).min(self.max_delay);

		if self.jitter && !delay.is_zero() {
			let floor = delay / 2;

			rand::rng().random_range(floor..=delay)
		} else {
			delay
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 2,
			base_delay: StdDuration::from_secs(5),
			max_delay: StdDuration::from_secs(10),
			jitter: false,
		}
	}
}

/// Why a failed attempt is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
	/// HTTP 429 or a throttling code.
	RateLimited,
	/// The access or refresh token was rejected; the next attempt re-acquires.
	TokenExpired,
	/// Gateway reported temporary unavailability.
	Transient,
}
impl RetryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::RateLimited => "rate_limited",
			Self::TokenExpired => "token_expired",
			Self::Transient => "transient",
		}
	}
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Retry verdict derived from a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryDecision {
	/// Whether another attempt may be made.
	pub should_retry: bool,
	/// Reason for retrying; `None` when the error is surfaced.
	pub reason: Option<RetryReason>,
	/// Whether the token used by the attempt must be discarded first.
	pub invalidate_token: bool,
}
impl RetryDecision {
	/// Surface the error unchanged.
	pub const SURFACE: Self = Self { should_retry: false, reason: None, invalidate_token: false };

	const fn retry(reason: RetryReason) -> Self {
		Self { should_retry: true, reason: Some(reason), invalidate_token: false }
	}

	/// Classifies a failed attempt.
	pub fn for_error(err: &Error) -> Self {
		match err {
			Error::Transient(TransientError::RateLimited { .. }) => Self::retry(RetryReason::RateLimited),
			Error::Transient(TransientError::Unavailable { .. }) => Self::retry(RetryReason::Transient),
			Error::Api(api) if api.code.is_throttle() => Self::retry(RetryReason::RateLimited),
			Error::Api(api) if api.code.rejects_access_token() || api.code.rejects_refresh_token() =>
				Self { invalidate_token: true, ..Self::retry(RetryReason::TokenExpired) },
			_ => Self::SURFACE,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{ApiError, TransportError};

	#[test]
	fn backoff_doubles_and_caps() {
		let policy = RetryPolicy::default();

		assert_eq!(policy.delay_for(1, None), StdDuration::from_secs(5));
		assert_eq!(policy.delay_for(2, None), StdDuration::from_secs(10));
		assert_eq!(policy.delay_for(9, None), StdDuration::from_secs(10));
		assert_eq!(policy.delay_for(1, Some(StdDuration::from_secs(3))), StdDuration::from_secs(3));
		assert_eq!(policy.delay_for(1, Some(StdDuration::from_secs(60))), StdDuration::from_secs(10));
		assert_eq!(RetryPolicy::immediate(2).delay_for(2, None), StdDuration::ZERO);
		assert_eq!(policy.max_attempts(), 3);
	}

	#[test]
	fn jitter_stays_within_half_window() {
		let policy = RetryPolicy { jitter: true, ..RetryPolicy::default() };

		for _ in 0..32 {
			let delay = policy.delay_for(2, None);

			assert!(delay >= StdDuration::from_secs(5) && delay <= StdDuration::from_secs(10));
		}
	}

	#[test]
	fn classifies_retryable_failures() {
		let throttled = Error::from(TransientError::RateLimited { status: 429, retry_after: None });
		let decision = RetryDecision::for_error(&throttled);

		assert!(decision.should_retry);
		assert_eq!(decision.reason, Some(RetryReason::RateLimited));
		assert!(!decision.invalidate_token);

		for code in [3001008, 103] {
			let decision = RetryDecision::for_error(&ApiError::new(code, "").into());

			assert_eq!(decision.reason, Some(RetryReason::RateLimited), "{code}");
		}
		for code in [2001003, 2001005, 2001008, 2001009] {
			let decision = RetryDecision::for_error(&ApiError::new(code, "").into());

			assert!(decision.should_retry, "{code}");
			assert!(decision.invalidate_token, "{code}");
			assert_eq!(decision.reason, Some(RetryReason::TokenExpired), "{code}");
		}

		let unavailable = Error::from(TransientError::Unavailable { status: 503, retry_after: None });

		assert_eq!(RetryDecision::for_error(&unavailable).reason, Some(RetryReason::Transient));
	}

	#[test]
	fn surfaces_everything_else() {
		for err in [
			Error::from(ApiError::new(2001006, "")),
			Error::from(ApiError::new(3001001, "")),
			Error::from(ApiError::new(500, "internal")),
			Error::from(TransportError::Timeout),
			Error::invalid_input("bad"),
			Error::NotFound,
		] {
			assert_eq!(RetryDecision::for_error(&err), RetryDecision::SURFACE, "{err}");
		}
	}

	#[test]
	fn rejects_inverted_delays() {
		let policy = RetryPolicy { base_delay: StdDuration::from_secs(11), ..RetryPolicy::default() };

		assert!(policy.validate().is_err());
		assert!(RetryPolicy::none().validate().is_ok());
	}
}
