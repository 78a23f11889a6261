//! Internal cache entry structure

use tokio::time::{Duration, Instant};

/// Expiry used when `now + ttl` does not fit in an [`Instant`]
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cache entry with a hard expiry
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
	pub(crate) value: Vec<u8>,
	pub(crate) expires_at: Instant,
}

impl CacheEntry {
	pub(crate) fn new(value: Vec<u8>, ttl: Duration) -> Self {
		let now = Instant::now();
		Self {
			value,
			expires_at: now
				.checked_add(ttl)
				.unwrap_or_else(|| now + FAR_FUTURE),
		}
	}

	pub(crate) fn remaining(&self) -> Duration {
		self.expires_at.saturating_duration_since(Instant::now())
	}

	/// An entry is dead from the instant its TTL has fully elapsed.
	pub(crate) fn is_expired(&self) -> bool {
		Instant::now() >= self.expires_at
	}
}
