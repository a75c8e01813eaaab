//! Spans for token renewals and dispatched requests.
//!
//! Every span is named `lingxing_client.op` and carries:
//!
//! - `op`: what runs inside it, one of `acquire`, `refresh`, or `dispatch` (see [`OpKind`]).
//! - `stage`: the call site that opened it, such as `acquire` in the lifecycle manager or
//!   `execute` in the dispatcher.
//! - `path`: the resource path of a dispatched request; left empty for token renewals.
//! - `attempt`: the current one-based attempt, updated by the retry loop so the value left
//!   on the span after it closes is the number of attempts made.
//!
//! Tokens, secrets, and signatures are never recorded on a span.

// self
use crate::{_prelude::*, obs::OpKind};

/// Future type produced by [`OpSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Future type produced by [`OpSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Handle to one `lingxing_client.op` span.
///
/// Cloning shares the underlying span, so the dispatcher can instrument its retry loop and
/// still record attempts from inside it.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a span for `kind` at the call site `stage`.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"lingxing_client.op",
				op = kind.as_str(),
				stage,
				path = tracing::field::Empty,
				attempt = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the resource path of a dispatched request.
	pub fn with_path(self, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		self.span.record("path", path);
		#[cfg(not(feature = "tracing"))]
		let _ = path;

		self
	}

	/// Records the attempt about to be made.
	pub fn record_attempt(&self, attempt: u32) {
		#[cfg(feature = "tracing")]
		self.span.record("attempt", attempt);
		#[cfg(not(feature = "tracing"))]
		let _ = attempt;
	}

	/// Runs `fut` inside the span without holding an entered guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = OpSpan::new(OpKind::Dispatch, "execute").with_path("/data/orders");
		let inner = span.clone();
		let value = span
			.instrument(async move {
				for attempt in 1..=3 {
					inner.record_attempt(attempt);
				}

				42
			})
			.await;

		assert_eq!(value, 42);
	}
}
