//! Token endpoint responses and ID token validation

use std::collections::HashMap;

use jsonwebtoken::Validation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OidcError;
use crate::jwks::JwksCache;

/// Raw token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Access token
	pub access_token: String,
	/// Token type (usually "Bearer")
	pub token_type: String,
	/// Lifetime of the access token in seconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Refresh token
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// ID token
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Granted scope
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
}

/// Validated ID token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
	/// Subject
	pub sub: String,
	/// Issuer
	pub iss: String,
	/// Expiration time (Unix timestamp)
	pub exp: i64,
	/// Issued at (Unix timestamp)
	#[serde(default)]
	pub iat: i64,
	/// Nonce
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
	/// Additional claims
	#[serde(flatten)]
	pub additional_claims: HashMap<String, Value>,
}

/// Tokens obtained from a completed code exchange
#[derive(Debug, Clone)]
pub struct TokenSet {
	/// Access token for the userinfo endpoint
	pub access_token: String,
	/// Token type
	pub token_type: String,
	/// Access token lifetime in seconds
	pub expires_in: Option<u64>,
	/// Refresh token, if issued
	pub refresh_token: Option<String>,
	/// Granted scope, if reported
	pub scope: Option<String>,
	/// Validated ID token claims
	pub claims: IdTokenClaims,
}

impl TokenSet {
	/// Verified subject identifier
	pub fn subject(&self) -> &str {
		&self.claims.sub
	}
}

/// Validates an ID token and binds it to `expected_nonce`
///
/// Signature, `iss`, `aud` and `exp` are checked against the provider JWKS.
pub async fn validate_id_token(
	id_token: &str,
	jwks: &JwksCache,
	issuer: &str,
	client_id: &str,
	expected_nonce: &str,
) -> Result<IdTokenClaims, OidcError> {
	let mut validation = Validation::default();
	validation.set_issuer(&[issuer]);
	validation.set_audience(&[client_id]);
	validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

	let claims: IdTokenClaims = jwks.verify(id_token, &validation).await?;

	if claims.nonce.as_deref() != Some(expected_nonce) {
		return Err(OidcError::NonceMismatch);
	}

	Ok(claims)
}
