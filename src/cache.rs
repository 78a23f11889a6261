//! Ephemeral flow storage.
//!
//! # Examples
//!
//! ```rust
//! use vouch::cache::InMemoryCache;
//!
//! let cache = InMemoryCache::new();
//! assert!(cache.is_empty());
//! ```

pub use vouch_cache::*;
