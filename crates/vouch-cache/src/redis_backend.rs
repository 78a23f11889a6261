//! Redis cache backend
//!
//! Shares pending flows between several instances behind one callback URL.
//! Expiry is delegated to Redis (`SET ... PX`), so entries vanish server-side
//! even if no instance ever reads them again.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;

use crate::backend::{CacheBackend, Claimed};
use crate::error::{CacheError, CacheResult};

/// Redis cache backend with connection pooling
#[derive(Clone)]
pub struct RedisCache {
	pool: Pool,
	key_prefix: String,
}

impl RedisCache {
	/// Creates a Redis cache from a connection URL such as `redis://localhost:6379`
	pub fn new(connection_url: impl Into<String>) -> CacheResult<Self> {
		let cfg = PoolConfig::from_url(connection_url.into());
		let pool = cfg
			.create_pool(Some(Runtime::Tokio1))
			.map_err(|e| CacheError::Backend(format!("Failed to create Redis pool: {}", e)))?;

		Ok(Self {
			pool,
			key_prefix: String::new(),
		})
	}

	/// Namespaces every key as `{prefix}:{key}`
	pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.key_prefix = prefix.into();
		self
	}

	fn build_key(&self, key: &str) -> String {
		if self.key_prefix.is_empty() {
			key.to_string()
		} else {
			format!("{}:{}", self.key_prefix, key)
		}
	}

	async fn connection(&self) -> CacheResult<Connection> {
		self.pool
			.get()
			.await
			.map_err(|e| CacheError::Backend(format!("Failed to get connection from pool: {}", e)))
	}
}

#[async_trait]
impl CacheBackend for RedisCache {
	async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
		let full_key = self.build_key(key);
		let mut conn = self.connection().await?;

		let _: () = conn
			.pset_ex(&full_key, value, expiry_millis(ttl))
			.await
			.map_err(|e| CacheError::Backend(format!("Failed to set value in Redis: {}", e)))?;
		Ok(())
	}

	async fn get_raw(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
		let full_key = self.build_key(key);
		let mut conn = self.connection().await?;

		conn.get(&full_key)
			.await
			.map_err(|e| CacheError::Backend(format!("Failed to get value from Redis: {}", e)))
	}

	async fn delete(&self, key: &str) -> CacheResult<bool> {
		let full_key = self.build_key(key);
		let mut conn = self.connection().await?;

		let removed: u64 = conn
			.del(&full_key)
			.await
			.map_err(|e| CacheError::Backend(format!("Failed to delete key from Redis: {}", e)))?;
		Ok(removed > 0)
	}

	async fn take_raw(&self, key: &str) -> CacheResult<Option<Claimed<Vec<u8>>>> {
		let full_key = self.build_key(key);
		let mut conn = self.connection().await?;

		let (pttl, value): (i64, Option<Vec<u8>>) = redis::pipe()
			.atomic()
			.cmd("PTTL")
			.arg(&full_key)
			.cmd("GETDEL")
			.arg(&full_key)
			.query_async(&mut conn)
			.await
			.map_err(|e| CacheError::Backend(format!("Failed to take key from Redis: {}", e)))?;

		Ok(value.map(|value| Claimed {
			value,
			remaining: Duration::from_millis(u64::try_from(pttl).unwrap_or(0)),
		}))
	}
}

/// Redis rejects `PX 0` and expiries beyond `i64::MAX` milliseconds
fn expiry_millis(ttl: Duration) -> u64 {
	u64::try_from(ttl.as_millis())
		.unwrap_or(u64::MAX)
		.clamp(1, i64::MAX as u64)
}
