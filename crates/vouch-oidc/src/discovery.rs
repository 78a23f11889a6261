//! OpenID Connect Discovery
//!
//! Fetches `.well-known/openid-configuration` and checks that the provider can
//! serve pushed, JARM-protected authorization code flows.

use serde::{Deserialize, Serialize};

use crate::error::OidcError;
use crate::http::HttpClient;
use crate::pkce::CHALLENGE_METHOD;

/// Path of the discovery document, relative to the issuer
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Provider metadata
///
/// Subset of the OpenID Provider Metadata this client relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
	/// Issuer URL
	pub issuer: String,
	/// Authorization endpoint URL
	pub authorization_endpoint: String,
	/// Token endpoint URL
	pub token_endpoint: String,
	/// JWKS URI
	pub jwks_uri: String,
	/// UserInfo endpoint URL (optional)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub userinfo_endpoint: Option<String>,
	/// Pushed authorization request endpoint (RFC 9126)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pushed_authorization_request_endpoint: Option<String>,
	/// Supported PKCE challenge methods
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_challenge_methods_supported: Option<Vec<String>>,
	/// Supported response modes
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_modes_supported: Option<Vec<String>>,
	/// Supported scopes
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scopes_supported: Option<Vec<String>>,
	/// Supported token endpoint client authentication methods
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_endpoint_auth_methods_supported: Option<Vec<String>>,
}

impl ProviderMetadata {
	/// Whether the provider advertises the `S256` PKCE method
	pub fn supports_pkce(&self) -> bool {
		self.code_challenge_methods_supported
			.as_ref()
			.is_some_and(|methods| methods.iter().any(|m| m == CHALLENGE_METHOD))
	}

	/// PAR endpoint, required by this client
	pub fn par_endpoint(&self) -> Result<&str, OidcError> {
		self.pushed_authorization_request_endpoint
			.as_deref()
			.ok_or_else(|| {
				OidcError::Configuration(
					"Provider does not advertise a pushed_authorization_request_endpoint"
						.to_string(),
				)
			})
	}
}

/// Discovery document client
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
	client: HttpClient,
}

impl DiscoveryClient {
	/// Creates a new discovery client
	pub fn new(client: HttpClient) -> Self {
		Self { client }
	}

	/// Fetches the discovery document from the issuer
	///
	/// # Arguments
	///
	/// * `issuer_url` - The OIDC issuer URL, with or without a trailing slash
	///
	/// # Errors
	///
	/// Returns [`OidcError::Discovery`] when the request fails, the document
	/// does not parse, or its `issuer` does not match `issuer_url`.
	pub async fn discover(&self, issuer_url: &str) -> Result<ProviderMetadata, OidcError> {
		let issuer_url = issuer_url.trim_end_matches('/');
		let discovery_url = format!("{}{}", issuer_url, DISCOVERY_PATH);
		tracing::debug!(url = %discovery_url, "Fetching OIDC discovery document");

		let response = self
			.client
			.client()
			.get(&discovery_url)
			.send()
			.await
			.map_err(|e| OidcError::Discovery(format!("Discovery request failed: {}", e)))?;

		if !response.status().is_success() {
			return Err(OidcError::Discovery(format!(
				"Discovery request failed: {}",
				response.status()
			)));
		}

		let document: ProviderMetadata = response
			.json()
			.await
			.map_err(|e| OidcError::Discovery(e.to_string()))?;

		if document.issuer.trim_end_matches('/') != issuer_url {
			return Err(OidcError::Discovery(format!(
				"Issuer mismatch: expected {}, got {}",
				issuer_url, document.issuer
			)));
		}

		Ok(document)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn metadata(methods: Option<Vec<&str>>) -> ProviderMetadata {
		ProviderMetadata {
			issuer: "https://idp.example.com".to_string(),
			authorization_endpoint: "https://idp.example.com/authorize".to_string(),
			token_endpoint: "https://idp.example.com/token".to_string(),
			jwks_uri: "https://idp.example.com/jwks".to_string(),
			userinfo_endpoint: None,
			pushed_authorization_request_endpoint: None,
			code_challenge_methods_supported: methods
				.map(|m| m.into_iter().map(String::from).collect()),
			response_modes_supported: None,
			scopes_supported: None,
			token_endpoint_auth_methods_supported: None,
		}
	}

	#[rstest]
	#[case(Some(vec!["S256"]), true)]
	#[case(Some(vec!["plain", "S256"]), true)]
	#[case(Some(vec!["plain"]), false)]
	#[case(Some(vec![]), false)]
	#[case(None, false)]
	fn test_supports_pkce(#[case] methods: Option<Vec<&str>>, #[case] expected: bool) {
		assert_eq!(metadata(methods).supports_pkce(), expected);
	}

	#[rstest]
	fn test_par_endpoint_required() {
		let mut document = metadata(None);
		assert!(matches!(
			document.par_endpoint(),
			Err(OidcError::Configuration(_))
		));

		document.pushed_authorization_request_endpoint =
			Some("https://idp.example.com/par".to_string());
		assert_eq!(document.par_endpoint().unwrap(), "https://idp.example.com/par");
	}

	#[rstest]
	fn test_deserialize_minimal_document() {
		let json = r#"{
			"issuer": "https://idp.example.com",
			"authorization_endpoint": "https://idp.example.com/authorize",
			"token_endpoint": "https://idp.example.com/token",
			"jwks_uri": "https://idp.example.com/jwks",
			"claims_supported": ["sub"]
		}"#;

		let document: ProviderMetadata = serde_json::from_str(json).unwrap();

		assert_eq!(document.issuer, "https://idp.example.com");
		assert!(document.userinfo_endpoint.is_none());
		assert!(!document.supports_pkce());
	}
}
