//! Ephemeral cache backends for in-flight verification flows
//!
//! Every entry carries a mandatory TTL. An entry is never observable once its
//! TTL has elapsed, whether or not it was ever read. Reads do not consume
//! entries: callers that need at-most-once semantics either `take` the entry
//! or `delete` it and inspect the returned flag.
//!
//! # Backends
//!
//! - [`InMemoryCache`]: process-local, sharded map with lazy expiry
//! - `RedisCache` (feature `redis-backend`): shared store using Redis `SET EX`
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vouch_cache::{CacheBackend, CacheExt, InMemoryCache};
//!
//! # async fn example() -> vouch_cache::CacheResult<()> {
//! let cache = InMemoryCache::new();
//! cache.set("state-123", &"pending", Duration::from_secs(120)).await?;
//!
//! let value: Option<String> = cache.get("state-123").await?;
//! assert_eq!(value.as_deref(), Some("pending"));
//!
//! assert!(cache.delete("state-123").await?);
//! # Ok(())
//! # }
//! ```

mod backend;
mod entry;
pub mod error;
pub mod in_memory;
#[cfg(feature = "redis-backend")]
pub mod redis_backend;

pub use backend::{CacheBackend, CacheExt, Claimed};
pub use error::{CacheError, CacheResult};
pub use in_memory::InMemoryCache;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisCache;
