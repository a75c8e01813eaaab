//! Optional observability hooks for token lifecycle operations and dispatched requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `lingxing_client.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus `warn`/`debug` events for retries,
//!   store failures, and debug-mode request traces.
//! - Enable `metrics` to increment `lingxing_client_op_total` for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and `lingxing_client_retry_total`
//!   labeled by `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a `tracing` event at `$level` when the `tracing` feature is enabled.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	}};
}
pub(crate) use event;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Full token acquisition with the app id/secret pair.
	Acquire,
	/// Token refresh with the refresh token.
	Refresh,
	/// Signed resource request.
	Dispatch,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Acquire => "acquire",
			OpKind::Refresh => "refresh",
			OpKind::Dispatch => "dispatch",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
