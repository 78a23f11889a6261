//! OIDC client error types

use thiserror::Error;
use vouch_conf::ConfigError;

/// OIDC client errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidcError {
	/// Settings or signing keys are missing or malformed
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Discovery document could not be fetched or is unusable
	#[error("Discovery error: {0}")]
	Discovery(String),

	/// Network error during HTTP requests
	#[error("Network error: {0}")]
	Network(String),

	/// Invalid response from provider
	#[error("Invalid response: {0}")]
	InvalidResponse(String),

	/// JWKS (JSON Web Key Set) error
	#[error("JWKS error: {0}")]
	Jwks(String),

	/// Invalid JWK (JSON Web Key)
	#[error("Invalid JWK: {0}")]
	InvalidJwk(String),

	/// Signature or claim validation of a provider JWT failed
	#[error("Token validation failed: {0}")]
	TokenValidation(String),

	/// Response `state` differs from the one the flow was started with
	#[error("State mismatch")]
	StateMismatch,

	/// ID token `nonce` is missing or differs from the expected one
	#[error("Nonce mismatch")]
	NonceMismatch,

	/// Userinfo `sub` differs from the ID token subject
	#[error("Subject mismatch")]
	SubjectMismatch,

	/// Provider reported an authorization error in its response
	#[error("Authorization error: {error}{}", describe(.description))]
	Authorization {
		error: String,
		description: Option<String>,
	},

	/// Pushed authorization request was refused
	#[error("Pushed authorization request failed: {0}")]
	Par(String),

	/// Token endpoint refused the code exchange
	#[error("Token exchange error: {0}")]
	TokenExchange(String),

	/// UserInfo endpoint error
	#[error("UserInfo error: {0}")]
	UserInfo(String),
}

fn describe(description: &Option<String>) -> String {
	description
		.as_deref()
		.map(|d| format!(" ({})", d))
		.unwrap_or_default()
}

impl OidcError {
	/// Whether this error means the response was not bound to the expected flow
	///
	/// Callers must not reveal which of these checks failed.
	pub fn is_security_mismatch(&self) -> bool {
		matches!(
			self,
			OidcError::StateMismatch | OidcError::NonceMismatch | OidcError::SubjectMismatch
		)
	}

	/// Whether retrying can never succeed without a configuration change
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			OidcError::Configuration(_) | OidcError::InvalidJwk(_) | OidcError::Discovery(_)
		)
	}
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for OidcError {
	fn from(error: reqwest::Error) -> Self {
		OidcError::Network(error.to_string())
	}
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for OidcError {
	fn from(error: serde_json::Error) -> Self {
		OidcError::InvalidResponse(error.to_string())
	}
}

/// Conversion from jsonwebtoken::errors::Error
impl From<jsonwebtoken::errors::Error> for OidcError {
	fn from(error: jsonwebtoken::errors::Error) -> Self {
		OidcError::TokenValidation(error.to_string())
	}
}

impl From<ConfigError> for OidcError {
	fn from(error: ConfigError) -> Self {
		OidcError::Configuration(error.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_display() {
		let error = OidcError::Network("Connection timeout".to_string());
		assert_eq!(error.to_string(), "Network error: Connection timeout");

		let error = OidcError::Authorization {
			error: "access_denied".to_string(),
			description: Some("User cancelled".to_string()),
		};
		assert_eq!(
			error.to_string(),
			"Authorization error: access_denied (User cancelled)"
		);

		let error = OidcError::Authorization {
			error: "access_denied".to_string(),
			description: None,
		};
		assert_eq!(error.to_string(), "Authorization error: access_denied");
	}

	#[test]
	fn test_error_from_serde_json() {
		let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
		let oidc_error: OidcError = json_error.into();

		assert!(matches!(oidc_error, OidcError::InvalidResponse(_)));
	}

	#[test]
	fn test_error_from_config_error() {
		let config_error = ConfigError::Missing("NUGGETS_OIDC_CLIENT_ID".to_string());
		let oidc_error: OidcError = config_error.into();

		assert_eq!(
			oidc_error,
			OidcError::Configuration("Missing setting: NUGGETS_OIDC_CLIENT_ID".to_string())
		);
		assert!(oidc_error.is_configuration());
	}

	#[test]
	fn test_security_mismatch_classification() {
		assert!(OidcError::StateMismatch.is_security_mismatch());
		assert!(OidcError::NonceMismatch.is_security_mismatch());
		assert!(OidcError::SubjectMismatch.is_security_mismatch());
		assert!(!OidcError::TokenExchange("invalid_grant".to_string()).is_security_mismatch());
	}
}
