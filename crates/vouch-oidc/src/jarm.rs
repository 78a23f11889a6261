//! JWT-secured authorization responses (JARM)
//!
//! With `response_mode=jwt` the provider returns a single signed `response`
//! parameter instead of `code` and `state`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::Validation;
use serde::{Deserialize, Serialize};

use crate::error::OidcError;
use crate::jwks::JwksCache;

/// Claims of an authorization response JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponseClaims {
	/// Issuer
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Correlation state
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// Authorization code
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Error code
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Error description
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}

/// Reads the `state` claim without verifying the signature
///
/// Only good for locating the pending flow; [`verify`] must still run before
/// anything in the response is trusted.
pub fn decode_state_unverified(response: &str) -> Result<String, OidcError> {
	let mut segments = response.trim().split('.');
	let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
		(Some(_), Some(payload), Some(_), None) => payload,
		_ => {
			return Err(OidcError::InvalidResponse(
				"Authorization response is not a compact JWT".to_string(),
			));
		}
	};

	let bytes = URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|e| OidcError::InvalidResponse(format!("Undecodable response payload: {}", e)))?;
	let claims: AuthorizationResponseClaims = serde_json::from_slice(&bytes)?;

	claims
		.state
		.filter(|s| !s.is_empty())
		.ok_or_else(|| OidcError::InvalidResponse("Authorization response has no state".to_string()))
}

/// Verifies an authorization response and returns its code
///
/// # Errors
///
/// * [`OidcError::TokenValidation`] - bad signature, issuer, audience or expiry
/// * [`OidcError::StateMismatch`] - `state` differs from `expected_state`
/// * [`OidcError::Authorization`] - the provider reported an error
/// * [`OidcError::InvalidResponse`] - no `code` claim
pub async fn verify(
	response: &str,
	jwks: &JwksCache,
	issuer: &str,
	client_id: &str,
	expected_state: &str,
) -> Result<String, OidcError> {
	let mut validation = Validation::default();
	validation.set_issuer(&[issuer]);
	validation.set_audience(&[client_id]);

	let claims: AuthorizationResponseClaims = jwks.verify(response.trim(), &validation).await?;

	if claims.state.as_deref() != Some(expected_state) {
		return Err(OidcError::StateMismatch);
	}

	if let Some(error) = claims.error {
		return Err(OidcError::Authorization {
			error,
			description: claims.error_description,
		});
	}

	claims
		.code
		.filter(|c| !c.is_empty())
		.ok_or_else(|| OidcError::InvalidResponse("Authorization response has no code".to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn unsigned(payload: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD.encode(payload.to_string());
		format!("{}.{}.c2lnbmF0dXJl", header, body)
	}

	#[rstest]
	fn test_decode_state_unverified() {
		let response = unsigned(&serde_json::json!({"state": "abc", "code": "xyz"}));

		assert_eq!(decode_state_unverified(&response).unwrap(), "abc");
	}

	#[rstest]
	#[case::missing_state(unsigned(&serde_json::json!({"code": "xyz"})))]
	#[case::empty_state(unsigned(&serde_json::json!({"state": ""})))]
	#[case::two_segments("aaa.bbb".to_string())]
	#[case::garbage("not-a-jwt".to_string())]
	#[case::bad_base64("a.!!!.c".to_string())]
	fn test_decode_state_rejects(#[case] response: String) {
		let result = decode_state_unverified(&response);

		assert!(matches!(result, Err(OidcError::InvalidResponse(_))));
	}
}
