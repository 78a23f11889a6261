//! Verification invites over OpenID Connect
//!
//! An agent asks a conversation participant to prove something (that they
//! can authenticate, are over 18, their legal name, or control of a social
//! account) by handing them a one-time link. The participant completes the
//! flow at the identity provider, which calls back with a signed response.
//! The callback is resolved into a [`CallbackOutcome`] and delivered back to
//! the conversation the invite was issued in.
//!
//! ## Flow
//!
//! 1. [`InviteIssuer::issue_invite`] pushes a PKCE and nonce bound request and
//!    parks its secrets in the cache for [`FLOW_TTL`], keyed by state.
//! 2. [`CallbackResolver::resolve_callback`] looks the state up, redeems the
//!    code, fetches userinfo, consumes the entry and delivers the outcome.
//!
//! Each invite yields at most one delivered outcome.

pub mod context;
pub mod delivery;
pub mod error;
pub mod flow;
pub mod intent;
pub mod issuer;
pub mod outcome;
pub mod resolver;
pub mod scope;
pub mod service;

pub use context::ConversationContext;
pub use delivery::{ChannelDelivery, DeliveredOutcome, OutcomeDelivery, TracingDelivery};
pub use error::{CallbackError, DeliveryError, InviteError};
pub use flow::{FLOW_TTL, PendingFlow};
pub use intent::{Intent, IntentTable};
pub use issuer::{Invite, InviteIssuer};
pub use outcome::{CallbackOutcome, OutcomeKind, PersonProof, SocialAccountProof};
pub use resolver::CallbackResolver;
pub use scope::VerificationScope;
pub use service::VerificationService;
