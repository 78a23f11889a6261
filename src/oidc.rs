//! OpenID Connect client.

pub use vouch_oidc::*;
