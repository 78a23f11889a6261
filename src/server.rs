//! HTTP transport.

#[cfg(feature = "server")]
pub use vouch_server::*;
