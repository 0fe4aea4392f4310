// self
use crate::{
	_prelude::*,
	obs::FlowKind,
	rate_limit::{BucketLevel, BucketLevelParseError},
};

/// Future returned by [`FlowSpan::instrument`]; `Instrumented<F>` under `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; the future itself without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `lightspeed_client.flow` span around a grant or a dispatched call.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens an info span with `flow` set to `kind` and `stage` set to the call site.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("lightspeed_client.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span. The span is entered on every poll, never held across `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Emits a debug event for an accepted bucket-level reading.
pub fn trace_bucket_level(level: &BucketLevel) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(level = level.level, max = level.max, "bucket level recorded");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = level;
	}
}

/// Emits a warning for a bucket-level header that could not be parsed.
pub fn trace_bucket_level_ignored(raw: &str, err: &BucketLevelParseError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(raw, error = %err, "bucket level header ignored");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (raw, err);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let body = FlowSpan::new(FlowKind::ApiRequest, "send")
			.instrument(async { serde_json::json!({ "Item": [] }) })
			.await;

		assert_eq!(body["Item"], serde_json::json!([]));
	}

	#[test]
	fn bucket_events_are_safe_without_subscriber() {
		trace_bucket_level(&BucketLevel::new(1., 60.));
		trace_bucket_level_ignored("x", &BucketLevelParseError::MissingSeparator { raw: "x".into() });
	}
}
