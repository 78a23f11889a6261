//! OpenID Connect client for one-shot verification flows
//!
//! Drives a single flow shape against one provider:
//!
//! - **Discovery** once per process, through [`ProviderResolver`]
//! - **PAR**: authorization parameters are pushed, never put in the browser URL
//! - **PKCE** (`S256`) challenge on every request
//! - **JARM**: the callback carries one signed `response` JWT
//! - **private_key_jwt** client authentication on PAR and token requests
//! - **ID token** validation with nonce binding, and userinfo subject binding
//!
//! # Example
//!
//! ```ignore
//! use vouch_conf::{EnvSettings, OidcSettings};
//! use vouch_oidc::{AuthorizationParams, CodeVerifier, IdentityProvider, OidcClient, random_token};
//!
//! let settings = OidcSettings::from_source(&EnvSettings::new())?;
//! let client = OidcClient::from_settings(settings);
//!
//! let verifier = CodeVerifier::generate();
//! let url = client
//! 	.push_authorization_request(&AuthorizationParams {
//! 		scope: "openid over18".to_string(),
//! 		state: random_token(),
//! 		nonce: random_token(),
//! 		code_challenge: verifier.challenge(),
//! 	})
//! 	.await?;
//! ```

pub mod client;
pub mod client_auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod jarm;
pub mod jwk;
pub mod jwks;
pub mod par;
pub mod pkce;
pub mod provider;
pub mod resolver;
pub mod token;
pub mod userinfo;

pub use client::OidcClient;
pub use client_auth::PrivateKeyJwt;
pub use config::{ClientConfig, ProviderCapabilities};
pub use discovery::{DiscoveryClient, ProviderMetadata};
pub use error::OidcError;
pub use http::HttpClient;
pub use jarm::decode_state_unverified;
pub use jwk::SigningKey;
pub use jwks::JwksCache;
pub use par::AuthorizationParams;
pub use pkce::{CodeChallenge, CodeVerifier, random_token};
pub use provider::{GrantChecks, IdentityProvider};
pub use resolver::ProviderResolver;
pub use token::{IdTokenClaims, TokenSet};
pub use userinfo::UserInfo;
