//! Server-reported bucket-level tracking and the caller's throttling hook.
//!
//! Lightspeed meters API usage with a leaky bucket and reports its fill state on each response
//! through a `"<level>/<max>"` header. [`RateLimitObserver`] keeps the latest reading and hands
//! it to an optional [`RateLimitSink`]. The sink is awaited on the request's own call path, so a
//! sink that sleeps delays the caller before the next request goes out.

// self
use crate::{_prelude::*, obs};

/// Boxed future returned by [`RateLimitSink::observe`].
pub type RateLimitFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Reaction hook invoked with every parsed bucket level.
pub trait RateLimitSink
where
	Self: Send + Sync,
{
	/// Reacts to the latest bucket level; may await (e.g. sleep) to throttle the caller.
	fn observe(&self, level: BucketLevel) -> RateLimitFuture<'_>;
}
impl<F, Fut> RateLimitSink for F
where
	F: Send + Sync + Fn(BucketLevel) -> Fut,
	Fut: 'static + Send + Future<Output = ()>,
{
	fn observe(&self, level: BucketLevel) -> RateLimitFuture<'_> {
		Box::pin(self(level))
	}
}

/// Reasons a bucket-level header value is rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum BucketLevelParseError {
	/// No `/` separates the level from the capacity.
	#[error("Bucket level `{raw}` is missing the `/` separator.")]
	MissingSeparator {
		/// Raw header value.
		raw: String,
	},
	/// One side is not a number.
	#[error("Bucket level component `{component}` is not a number.")]
	InvalidNumber {
		/// Offending component.
		component: String,
	},
	/// One side is NaN or infinite.
	#[error("Bucket level component `{component}` is not finite.")]
	NonFinite {
		/// Offending component.
		component: String,
	},
}

/// Current fill state of the server-side bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketLevel {
	/// Current fill amount.
	pub level: f64,
	/// Bucket capacity.
	pub max: f64,
}
impl BucketLevel {
	/// Creates a bucket level from raw numbers.
	pub fn new(level: f64, max: f64) -> Self {
		Self { level, max }
	}

	/// Parses a `"<level>/<max>"` header value.
	pub fn parse(raw: &str) -> Result<Self, BucketLevelParseError> {
		let (level, max) = raw
			.split_once('/')
			.ok_or_else(|| BucketLevelParseError::MissingSeparator { raw: raw.to_owned() })?;

		Ok(Self { level: parse_component(level)?, max: parse_component(max)? })
	}

	/// Capacity left before the bucket overflows (never negative).
	pub fn remaining(&self) -> f64 {
		(self.max - self.level).max(0.)
	}

	/// Fill ratio in `[0, 1]` for well-formed readings; `0` when the capacity is not positive.
	pub fn ratio(&self) -> f64 {
		if self.max > 0. { self.level / self.max } else { 0. }
	}
}
impl FromStr for BucketLevel {
	type Err = BucketLevelParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

fn parse_component(component: &str) -> Result<f64, BucketLevelParseError> {
	let trimmed = component.trim();
	let value = trimmed
		.parse::<f64>()
		.map_err(|_| BucketLevelParseError::InvalidNumber { component: trimmed.to_owned() })?;

	if value.is_finite() {
		Ok(value)
	} else {
		Err(BucketLevelParseError::NonFinite { component: trimmed.to_owned() })
	}
}

/// Tracks the most recent bucket level and forwards it to the configured sink.
#[derive(Default)]
pub struct RateLimitObserver {
	current: RwLock<Option<BucketLevel>>,
	sink: Option<Arc<dyn RateLimitSink>>,
}
impl RateLimitObserver {
	/// Creates an observer that only records readings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches a reaction hook.
	pub fn with_sink(mut self, sink: Arc<dyn RateLimitSink>) -> Self {
		self.sink = Some(sink);

		self
	}

	/// Latest bucket level, if any response has reported one.
	pub fn current(&self) -> Option<BucketLevel> {
		*self.current.read()
	}

	/// Parses and stores a raw header value, then awaits the sink.
	///
	/// Malformed values leave the previous reading untouched, skip the sink, and return `None`.
	pub async fn record(&self, raw: &str) -> Option<BucketLevel> {
		let level = match BucketLevel::parse(raw) {
			Ok(level) => level,
			Err(err) => {
				obs::bucket_level_ignored(raw, &err);

				return None;
			},
		};

		*self.current.write() = Some(level);

		obs::bucket_level_recorded(&level);

		if let Some(sink) = &self.sink {
			sink.observe(level).await;
		}

		Some(level)
	}
}
impl Debug for RateLimitObserver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimitObserver")
			.field("current", &self.current())
			.field("sink_set", &self.sink.is_some())
			.finish()
	}
}
