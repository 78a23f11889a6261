//! HTTP transport for verification invites
//!
//! Exposes the provider callback at [`CALLBACK_PATH`](vouch_conf::CALLBACK_PATH)
//! and an invite endpoint at [`INVITES_PATH`] for agents that do not embed
//! [`vouch_invite::VerificationService`] directly.
//!
//! ## Status codes
//!
//! - `200`: callback resolved, or invite issued
//! - `400`: unknown, expired, replayed or tampered callback; malformed invite request
//! - `404` / `405`: unknown route or method
//! - `502`: identity provider, cache or delivery failure

pub mod error;
pub mod handler;
pub mod server;

pub use error::{REJECTED_MESSAGE, ServerError};
pub use handler::{COMPLETED_MESSAGE, INVITES_PATH, VerificationHandler};
pub use server::{DEFAULT_MAX_BODY_SIZE, HttpServer};
