//! # Vouch
//!
//! One-time verification invites for conversational agents, built on an
//! OpenID Connect authorization code flow.
//!
//! An agent asks a participant to authenticate or to prove a claim (age over
//! 18, legal name, control of a Twitter or Github account). The participant
//! opens a single-use link, completes the flow at the identity provider, and
//! the signed callback is resolved back into the conversation the invite was
//! issued in. No personal data is collected by the agent itself.
//!
//! ## Crates
//!
//! - [`cache`]: TTL stores for in-flight flows (in-memory, Redis)
//! - [`conf`]: settings sources and validated OIDC settings
//! - [`oidc`]: discovery, PAR, JARM, `private_key_jwt`, token and userinfo calls
//! - [`invite`]: invite issuance, callback resolution, outcome normalization
//! - [`server`]: HTTP transport (feature `server`, on by default)
//!
//! ## Feature Flags
//!
//! - `server` (default): HTTP transport and the `vouch-server` binary
//! - `redis-backend`: Redis cache backend for multi-process deployments
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vouch::prelude::*;
//!
//! let service = VerificationService::from_source(&EnvSettings::new(), Arc::new(TracingDelivery))?;
//! let context = ConversationContext::new(agent_id, room_id, entity_id);
//!
//! let invite = service.issue_invite(VerificationScope::Over18, context).await?;
//! // Hand `invite.url` to the user; the provider later calls back with `response`.
//! let outcome = service.resolve_callback(&response).await?;
//! println!("{}", outcome.summary());
//! ```

pub mod cache;
pub mod conf;
pub mod invite;
pub mod oidc;
#[cfg(feature = "server")]
pub mod server;

/// Commonly used types
pub mod prelude {
	pub use vouch_cache::{CacheBackend, CacheExt, InMemoryCache};
	pub use vouch_conf::{EnvSettings, MemorySettings, OidcSettings, SettingsSource};
	pub use vouch_invite::{
		CallbackError, CallbackOutcome, ChannelDelivery, ConversationContext, Invite,
		InviteError, OutcomeDelivery, OutcomeKind, TracingDelivery, VerificationScope,
		VerificationService,
	};
	pub use vouch_oidc::{IdentityProvider, OidcClient, OidcError};
	#[cfg(feature = "server")]
	pub use vouch_server::{HttpServer, VerificationHandler};
}
