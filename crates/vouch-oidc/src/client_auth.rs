//! `private_key_jwt` client authentication (RFC 7523)

use chrono::Utc;
use jsonwebtoken::{Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OidcError;
use crate::jwk::SigningKey;

/// Token endpoint authentication method advertised by this client
pub const AUTH_METHOD: &str = "private_key_jwt";

/// `client_assertion_type` form value
pub const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Assertion lifetime in seconds
const ASSERTION_TTL_SECS: i64 = 60;

/// Claims of a client assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer (client ID)
	pub iss: String,
	/// Subject (client ID)
	pub sub: String,
	/// Audience (provider issuer)
	pub aud: String,
	/// Unique token identifier
	pub jti: String,
	/// Issued at (Unix timestamp)
	pub iat: i64,
	/// Expiration time (Unix timestamp)
	pub exp: i64,
}

/// Signs short-lived client assertions with the client's private key
#[derive(Debug, Clone)]
pub struct PrivateKeyJwt {
	client_id: String,
	key: SigningKey,
}

impl PrivateKeyJwt {
	/// Creates an authenticator from an already loaded key
	pub fn new(client_id: impl Into<String>, key: SigningKey) -> Self {
		Self {
			client_id: client_id.into(),
			key,
		}
	}

	/// Creates an authenticator from a JWK Set JSON document
	pub fn from_jwk_set(client_id: impl Into<String>, json: &str) -> Result<Self, OidcError> {
		Ok(Self::new(client_id, SigningKey::from_jwk_set(json)?))
	}

	/// Client identifier used as `iss` and `sub`
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Signs a fresh assertion for `audience`
	pub fn assertion(&self, audience: &str) -> Result<String, OidcError> {
		let now = Utc::now().timestamp();
		let claims = AssertionClaims {
			iss: self.client_id.clone(),
			sub: self.client_id.clone(),
			aud: audience.to_string(),
			jti: Uuid::new_v4().to_string(),
			iat: now,
			exp: now + ASSERTION_TTL_SECS,
		};

		let mut header = Header::new(self.key.algorithm());
		header.kid = self.key.kid().map(String::from);

		encode(&header, &claims, self.key.encoding_key())
			.map_err(|e| OidcError::Configuration(format!("Cannot sign client assertion: {}", e)))
	}

	/// Form parameters authenticating a request to `audience`
	pub fn form_params(&self, audience: &str) -> Result<Vec<(&'static str, String)>, OidcError> {
		Ok(vec![
			("client_id", self.client_id.clone()),
			("client_assertion_type", ASSERTION_TYPE.to_string()),
			("client_assertion", self.assertion(audience)?),
		])
	}
}
