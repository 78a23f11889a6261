//! In-memory cache implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::{CacheBackend, Claimed};
use crate::entry::CacheEntry;
use crate::error::CacheResult;

/// Number of writes between two opportunistic sweeps of expired entries
const SWEEP_EVERY: u64 = 64;

/// In-memory cache backend
///
/// Entries live in a sharded map, so writers on distinct keys never contend
/// on a single lock. Expiry is checked lazily on access; abandoned entries are
/// swept opportunistically on writes, no background task is spawned.
///
/// Entries do not survive a process restart. A flow interrupted by a restart
/// simply expires.
#[derive(Clone, Default)]
pub struct InMemoryCache {
	entries: Arc<DashMap<String, CacheEntry>>,
	writes: Arc<AtomicU64>,
}

impl InMemoryCache {
	/// Creates an empty cache
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored entries, including expired ones not swept yet
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no entry is stored
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Removes every expired entry
	pub fn cleanup_expired(&self) {
		let before = self.entries.len();
		self.entries.retain(|_, entry| !entry.is_expired());
		let swept = before.saturating_sub(self.entries.len());
		if swept > 0 {
			tracing::debug!(swept, "Swept expired cache entries");
		}
	}
}

#[async_trait]
impl CacheBackend for InMemoryCache {
	async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
		if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
			self.cleanup_expired();
		}

		self.entries
			.insert(key.to_string(), CacheEntry::new(value, ttl));
		Ok(())
	}

	async fn get_raw(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
		let expired = match self.entries.get(key) {
			Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
			Some(_) => true,
			None => false,
		};

		if expired {
			self.entries.remove_if(key, |_, entry| entry.is_expired());
		}

		Ok(None)
	}

	async fn delete(&self, key: &str) -> CacheResult<bool> {
		Ok(self
			.entries
			.remove(key)
			.is_some_and(|(_, entry)| !entry.is_expired()))
	}

	async fn take_raw(&self, key: &str) -> CacheResult<Option<Claimed<Vec<u8>>>> {
		Ok(self
			.entries
			.remove(key)
			.filter(|(_, entry)| !entry.is_expired())
			.map(|(_, entry)| Claimed {
				remaining: entry.remaining(),
				value: entry.value,
			}))
	}
}
