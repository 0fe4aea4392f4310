//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - `tracing`: each grant and API call runs inside a `lightspeed_client.flow` span carrying
//!   `flow` and `stage`. Bucket readings are emitted as `debug` events and rejected bucket
//!   headers as `warn` events.
//! - `metrics`: `lightspeed_client_flow_total` counts attempts and outcomes per `flow`, and the
//!   `lightspeed_client_bucket_ratio` gauge holds the last bucket fill ratio.
//!
//! With both features off every helper compiles to nothing.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{
	_prelude::*,
	rate_limit::{BucketLevel, BucketLevelParseError},
};

macro_rules! labeled {
	($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal,)+ }) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant,)+
		}
		impl $name {
			/// Stable label used in span fields and metric labels.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

labeled! {
	/// Client operations that are traced and counted.
	FlowKind {
		/// `authorization_code` grant sent to the token endpoint.
		AuthorizationCode => "authorization_code",
		/// `refresh_token` grant sent to the token endpoint.
		Refresh => "refresh",
		/// Call dispatched through the request dispatcher.
		ApiRequest => "api_request",
	}
}

labeled! {
	/// Stage of a flow reported to the metrics backend.
	FlowOutcome {
		/// The flow started.
		Attempt => "attempt",
		/// The flow returned `Ok`.
		Success => "success",
		/// The flow returned an error to its caller.
		Failure => "failure",
	}
}

/// Reports an accepted bucket-level reading to every enabled backend.
pub fn bucket_level_recorded(level: &BucketLevel) {
	trace_bucket_level(level);
	record_bucket_ratio(level);
}

/// Reports a bucket-level header that could not be parsed.
pub fn bucket_level_ignored(raw: &str, err: &BucketLevelParseError) {
	trace_bucket_level_ignored(raw, err);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_snake_case() {
		assert_eq!(FlowKind::AuthorizationCode.to_string(), "authorization_code");
		assert_eq!(FlowKind::ApiRequest.as_str(), "api_request");
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
	}
}
