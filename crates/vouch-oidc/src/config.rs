//! Resolved client configuration

use crate::client_auth::{AUTH_METHOD, PrivateKeyJwt};
use crate::discovery::ProviderMetadata;
use crate::jwks::JwksCache;

/// Grant types advertised in the client's capabilities
pub const GRANT_TYPES: [&str; 2] = ["authorization_code", "refresh_token"];

/// Everything needed to drive flows against one provider
///
/// Built once per process by [`ProviderResolver`](crate::ProviderResolver)
/// and immutable afterwards.
#[derive(Debug)]
pub struct ClientConfig {
	/// Discovered provider metadata
	pub metadata: ProviderMetadata,
	/// OAuth client identifier
	pub client_id: String,
	/// Fixed redirect URI of this deployment
	pub redirect_uri: String,
	/// Client assertion signer for PAR and token requests
	pub client_auth: PrivateKeyJwt,
	/// Provider signing keys
	pub jwks: JwksCache,
}

impl ClientConfig {
	/// Issuer identifier, the audience of client assertions
	pub fn issuer(&self) -> &str {
		&self.metadata.issuer
	}

	/// Whether the provider advertises `S256` PKCE
	pub fn supports_pkce(&self) -> bool {
		self.metadata.supports_pkce()
	}

	/// Grant types this client registers for
	pub fn grant_types(&self) -> &'static [&'static str] {
		&GRANT_TYPES
	}

	/// Token endpoint authentication method
	pub fn token_endpoint_auth_method(&self) -> &'static str {
		AUTH_METHOD
	}

	/// Capability summary handed to flow orchestration
	pub fn capabilities(&self) -> ProviderCapabilities {
		ProviderCapabilities {
			issuer: self.metadata.issuer.clone(),
			pkce_supported: self.supports_pkce(),
		}
	}
}

/// What a loaded provider can do, as seen by flow orchestration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapabilities {
	/// Issuer identifier
	pub issuer: String,
	/// Whether `S256` PKCE is advertised
	pub pkce_supported: bool,
}
