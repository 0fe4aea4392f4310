// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	rate_limit::BucketLevel,
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"lightspeed_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Publishes the latest bucket fill ratio (when enabled).
pub fn record_bucket_ratio(level: &BucketLevel) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("lightspeed_client_bucket_ratio").set(level.ratio());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = level;
	}
}
