//! Settings for the verification invite service
//!
//! [`SettingsSource`] is the narrow interface the service consumes from its
//! host runtime: a lookup of a named setting that may be absent. The
//! [`OidcSettings`] type validates the settings the OIDC client needs and
//! derives the fixed redirect URI.

pub mod error;
pub mod oidc;
pub mod sources;

pub use error::ConfigError;
pub use oidc::{CALLBACK_PATH, OidcSettings, names};
pub use sources::{ChainedSettings, EnvSettings, MemorySettings, SettingsSource};
