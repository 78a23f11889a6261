//! Pushed authorization requests (RFC 9126)

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OidcError;
use crate::pkce::{CHALLENGE_METHOD, CodeChallenge};

/// Response type of every request: authorization code
pub const RESPONSE_TYPE: &str = "code";
/// Response mode of every request: JWT-secured authorization response (JARM)
pub const RESPONSE_MODE: &str = "jwt";

/// Per-flow authorization request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationParams {
	/// Full requested scope, including `openid`
	pub scope: String,
	/// Correlation state
	pub state: String,
	/// ID token nonce
	pub nonce: String,
	/// PKCE `S256` challenge
	pub code_challenge: CodeChallenge,
}

impl AuthorizationParams {
	/// Form fields pushed to the provider, excluding client authentication
	pub fn to_form(&self, redirect_uri: &str) -> Vec<(&'static str, String)> {
		vec![
			("scope", self.scope.clone()),
			("response_type", RESPONSE_TYPE.to_string()),
			("response_mode", RESPONSE_MODE.to_string()),
			("state", self.state.clone()),
			("nonce", self.nonce.clone()),
			("code_challenge", self.code_challenge.as_str().to_string()),
			("code_challenge_method", CHALLENGE_METHOD.to_string()),
			("redirect_uri", redirect_uri.to_string()),
		]
	}
}

/// Successful PAR response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedAuthorizationResponse {
	/// Reference to the pushed request
	pub request_uri: String,
	/// Lifetime of `request_uri` in seconds
	pub expires_in: u64,
}

/// OAuth error body returned by provider endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error code
	pub error: String,
	/// Human-readable description
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}

impl std::fmt::Display for ErrorResponse {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.error_description {
			Some(description) => write!(f, "{}: {}", self.error, description),
			None => f.write_str(&self.error),
		}
	}
}

/// Builds the browser redirect URL for a pushed request
pub fn authorization_url(
	authorization_endpoint: &str,
	client_id: &str,
	request_uri: &str,
) -> Result<String, OidcError> {
	let mut url = Url::parse(authorization_endpoint)
		.map_err(|e| OidcError::Par(format!("Invalid authorization endpoint: {}", e)))?;
	url.query_pairs_mut()
		.append_pair("client_id", client_id)
		.append_pair("request_uri", request_uri);
	Ok(url.into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pkce::CodeVerifier;
	use rstest::rstest;

	#[rstest]
	fn test_form_fields() {
		// Arrange
		let verifier = CodeVerifier::from_secret("verifier");
		let params = AuthorizationParams {
			scope: "openid over18".to_string(),
			state: "state-1".to_string(),
			nonce: "nonce-1".to_string(),
			code_challenge: verifier.challenge(),
		};

		// Act
		let form = params.to_form("http://localhost:3000/api/oidc/callback");

		// Assert
		let get = |name: &str| {
			form.iter()
				.find(|(k, _)| *k == name)
				.map(|(_, v)| v.as_str())
		};
		assert_eq!(get("scope"), Some("openid over18"));
		assert_eq!(get("response_type"), Some("code"));
		assert_eq!(get("response_mode"), Some("jwt"));
		assert_eq!(get("code_challenge_method"), Some("S256"));
		assert_eq!(get("code_challenge"), Some(verifier.challenge().as_str()));
		assert_eq!(
			get("redirect_uri"),
			Some("http://localhost:3000/api/oidc/callback")
		);
	}

	#[rstest]
	fn test_authorization_url() {
		let url = authorization_url(
			"https://idp.example.com/authorize",
			"agent-client",
			"urn:ietf:params:oauth:request_uri:abc",
		)
		.unwrap();

		assert_eq!(
			url,
			"https://idp.example.com/authorize?client_id=agent-client&request_uri=urn%3Aietf%3Aparams%3Aoauth%3Arequest_uri%3Aabc"
		);
	}

	#[rstest]
	fn test_error_response_display() {
		let error: ErrorResponse =
			serde_json::from_str(r#"{"error":"invalid_request","error_description":"bad scope"}"#)
				.unwrap();

		assert_eq!(error.to_string(), "invalid_request: bad scope");
	}
}
