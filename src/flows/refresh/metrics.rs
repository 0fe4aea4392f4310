// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::FlowOutcome;

/// In-process counters for refresh grants, indexed by [`FlowOutcome`].
///
/// Only grants that reach the token endpoint are counted. A token that was still valid, or that
/// a concurrent caller already renewed, leaves the counters untouched.
#[derive(Debug, Default)]
pub struct RefreshMetrics([AtomicU64; 3]);
impl RefreshMetrics {
	/// Refresh grants sent.
	pub fn attempts(&self) -> u64 {
		self.get(FlowOutcome::Attempt)
	}

	/// Refresh grants whose token was installed and handed to the sink.
	pub fn successes(&self) -> u64 {
		self.get(FlowOutcome::Success)
	}

	/// Refresh grants rejected by the endpoint, undecodable, or refused by the sink.
	pub fn failures(&self) -> u64 {
		self.get(FlowOutcome::Failure)
	}

	/// Current value for `outcome`.
	pub fn get(&self, outcome: FlowOutcome) -> u64 {
		self.0[slot(outcome)].load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: FlowOutcome) {
		self.0[slot(outcome)].fetch_add(1, Ordering::Relaxed);
	}
}

fn slot(outcome: FlowOutcome) -> usize {
	match outcome {
		FlowOutcome::Attempt => 0,
		FlowOutcome::Success => 1,
		FlowOutcome::Failure => 2,
	}
}
