//! Cache backend trait

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheResult;

/// Byte-level TTL store
///
/// Implementations must guarantee that:
///
/// - an entry is not returned by [`get_raw`](Self::get_raw) once `ttl` has elapsed
/// - reads never remove entries
/// - operations on distinct keys never interfere with each other
#[async_trait]
pub trait CacheBackend: Send + Sync {
	/// Stores `value` under `key`, replacing any previous entry
	async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

	/// Returns the live value stored under `key`
	async fn get_raw(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

	/// Removes `key`
	///
	/// Returns `true` only when a live entry was removed. Removing an absent or
	/// already expired key returns `false`, so concurrent consumers can tell
	/// which of them won.
	async fn delete(&self, key: &str) -> CacheResult<bool>;

	/// Atomically removes `key` and returns its live value
	///
	/// Of several concurrent callers at most one receives the entry. The
	/// returned [`Claimed::remaining`] lets a caller put the entry back
	/// without extending its lifetime.
	async fn take_raw(&self, key: &str) -> CacheResult<Option<Claimed<Vec<u8>>>>;
}

/// Entry removed by [`CacheBackend::take_raw`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claimed<T> {
	/// Stored value
	pub value: T,
	/// Lifetime the entry had left when it was removed
	pub remaining: Duration,
}

/// JSON-typed helpers over any [`CacheBackend`]
#[async_trait]
pub trait CacheExt: CacheBackend {
	/// Serializes `value` as JSON and stores it
	async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()>
	where
		T: Serialize + Sync,
	{
		let bytes = serde_json::to_vec(value)?;
		self.set_raw(key, bytes, ttl).await
	}

	/// Fetches and deserializes the value stored under `key`
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: DeserializeOwned + Send,
	{
		match self.get_raw(key).await? {
			Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
			None => Ok(None),
		}
	}

	/// Atomically removes and deserializes the value stored under `key`
	async fn take<T>(&self, key: &str) -> CacheResult<Option<Claimed<T>>>
	where
		T: DeserializeOwned + Send,
	{
		match self.take_raw(key).await? {
			Some(claimed) => Ok(Some(Claimed {
				value: serde_json::from_slice(&claimed.value)?,
				remaining: claimed.remaining,
			})),
			None => Ok(None),
		}
	}
}

impl<C: CacheBackend + ?Sized> CacheExt for C {}
