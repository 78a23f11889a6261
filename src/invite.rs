//! Invite issuance and callback resolution.
//!
//! # Examples
//!
//! ```rust
//! use vouch::invite::VerificationScope;
//!
//! let scope: VerificationScope = "over18".parse().unwrap();
//! assert_eq!(scope.requested_scope(), "openid over18");
//! ```

pub use vouch_invite::*;
