//! Test tooling for vouch crates
//!
//! - [`MockProvider`]: in-process OIDC provider speaking PAR, JARM and
//!   `private_key_jwt`
//! - [`fixtures`]: the client's RSA signing key and P-256 key generation

pub mod fixtures;
pub mod mock_provider;

pub use fixtures::EcKeyPair;
pub use mock_provider::{DEFAULT_SUBJECT, Endpoint, ErrorMode, MockProvider, REDIRECT_URI, Tampering};
