//! Settings sources and OIDC settings.

pub use vouch_conf::*;
