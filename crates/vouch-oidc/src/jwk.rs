//! Client signing keys loaded from a private JWK Set

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey};
use p256::pkcs8::EncodePrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{BigUint, RsaPrivateKey};
use serde::Deserialize;

use crate::error::OidcError;

const RSA_ALGORITHMS: [Algorithm; 6] = [
	Algorithm::RS256,
	Algorithm::RS384,
	Algorithm::RS512,
	Algorithm::PS256,
	Algorithm::PS384,
	Algorithm::PS512,
];

#[derive(Deserialize)]
struct PrivateJwkSet {
	keys: Vec<PrivateJwk>,
}

#[derive(Deserialize)]
struct PrivateJwk {
	kty: String,
	#[serde(default)]
	kid: Option<String>,
	#[serde(default)]
	alg: Option<String>,
	#[serde(default)]
	crv: Option<String>,
	#[serde(default)]
	n: Option<String>,
	#[serde(default)]
	e: Option<String>,
	#[serde(default)]
	d: Option<String>,
	#[serde(default)]
	p: Option<String>,
	#[serde(default)]
	q: Option<String>,
}

/// Private key used to sign client assertions
#[derive(Clone)]
pub struct SigningKey {
	algorithm: Algorithm,
	key: EncodingKey,
	kid: Option<String>,
}

impl SigningKey {
	/// Loads the first key of a JWK Set JSON document
	///
	/// RSA keys sign with their declared `alg` (RS256 when absent); EC keys
	/// must be on P-256 and sign with ES256.
	pub fn from_jwk_set(json: &str) -> Result<Self, OidcError> {
		let set: PrivateJwkSet = serde_json::from_str(json)
			.map_err(|e| OidcError::InvalidJwk(format!("Malformed JWK Set: {}", e)))?;
		let jwk = set
			.keys
			.into_iter()
			.next()
			.ok_or_else(|| OidcError::InvalidJwk("JWK Set has no keys".to_string()))?;

		match jwk.kty.as_str() {
			"RSA" => Self::from_rsa(jwk),
			"EC" => Self::from_ec(jwk),
			other => Err(OidcError::InvalidJwk(format!(
				"Unsupported key type: {}",
				other
			))),
		}
	}

	fn from_rsa(jwk: PrivateJwk) -> Result<Self, OidcError> {
		let algorithm = match jwk.alg.as_deref() {
			None => Algorithm::RS256,
			Some(alg) => Algorithm::from_str(alg)
				.ok()
				.filter(|a| RSA_ALGORITHMS.contains(a))
				.ok_or_else(|| {
					OidcError::InvalidJwk(format!("Unsupported RSA algorithm: {}", alg))
				})?,
		};

		let n = big_uint("n", jwk.n.as_deref())?;
		let e = big_uint("e", jwk.e.as_deref())?;
		let d = big_uint("d", jwk.d.as_deref())?;
		let p = big_uint("p", jwk.p.as_deref())?;
		let q = big_uint("q", jwk.q.as_deref())?;

		let private_key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
			.map_err(|e| OidcError::InvalidJwk(format!("Invalid RSA key: {}", e)))?;
		let der = private_key
			.to_pkcs1_der()
			.map_err(|e| OidcError::InvalidJwk(format!("Invalid RSA key: {}", e)))?;

		Ok(Self {
			algorithm,
			key: EncodingKey::from_rsa_der(der.as_bytes()),
			kid: jwk.kid,
		})
	}

	fn from_ec(jwk: PrivateJwk) -> Result<Self, OidcError> {
		match jwk.crv.as_deref() {
			Some("P-256") => {}
			other => {
				return Err(OidcError::InvalidJwk(format!(
					"Unsupported EC curve: {}",
					other.unwrap_or("none")
				)));
			}
		}
		if let Some(alg) = jwk.alg.as_deref()
			&& alg != "ES256"
		{
			return Err(OidcError::InvalidJwk(format!(
				"Unsupported EC algorithm: {}",
				alg
			)));
		}

		let d = decode_component("d", jwk.d.as_deref())?;
		let secret = p256::SecretKey::from_slice(&d)
			.map_err(|e| OidcError::InvalidJwk(format!("Invalid EC key: {}", e)))?;
		let der = secret
			.to_pkcs8_der()
			.map_err(|e| OidcError::InvalidJwk(format!("Invalid EC key: {}", e)))?;

		Ok(Self {
			algorithm: Algorithm::ES256,
			key: EncodingKey::from_ec_der(der.as_bytes()),
			kid: jwk.kid,
		})
	}

	/// Signing algorithm
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	/// Key identifier placed in the JWT header
	pub fn kid(&self) -> Option<&str> {
		self.kid.as_deref()
	}

	/// Key material for [`jsonwebtoken::encode`]
	pub fn encoding_key(&self) -> &EncodingKey {
		&self.key
	}
}

impl fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningKey")
			.field("algorithm", &self.algorithm)
			.field("kid", &self.kid)
			.finish_non_exhaustive()
	}
}

fn decode_component(name: &str, value: Option<&str>) -> Result<Vec<u8>, OidcError> {
	let value =
		value.ok_or_else(|| OidcError::InvalidJwk(format!("Missing key parameter: {}", name)))?;
	URL_SAFE_NO_PAD
		.decode(value.trim_end_matches('='))
		.map_err(|e| OidcError::InvalidJwk(format!("Invalid key parameter {}: {}", name, e)))
}

fn big_uint(name: &str, value: Option<&str>) -> Result<BigUint, OidcError> {
	decode_component(name, value).map(|bytes| BigUint::from_bytes_be(&bytes))
}

#[cfg(test)]
mod tests {
	use super::*;
	use jsonwebtoken::{DecodingKey, Header, Validation, decode, encode};
	use rstest::rstest;
	use serde::Serialize;
	use vouch_test::fixtures;

	#[derive(Debug, Serialize, Deserialize, PartialEq)]
	struct Claims {
		sub: String,
		exp: i64,
	}

	fn claims() -> Claims {
		Claims {
			sub: "agent-client".to_string(),
			exp: chrono::Utc::now().timestamp() + 60,
		}
	}

	#[rstest]
	fn test_rsa_key_signs_verifiable_tokens() {
		// Arrange
		let key = SigningKey::from_jwk_set(fixtures::CLIENT_JWK_SET).unwrap();
		let mut header = Header::new(key.algorithm());
		header.kid = key.kid().map(String::from);

		// Act
		let token = encode(&header, &claims(), key.encoding_key()).unwrap();

		// Assert
		let decoding_key =
			DecodingKey::from_rsa_components(fixtures::CLIENT_KEY_N, fixtures::CLIENT_KEY_E)
				.unwrap();
		let decoded = decode::<Claims>(&token, &decoding_key, &Validation::new(Algorithm::RS256))
			.unwrap();
		assert_eq!(decoded.claims.sub, "agent-client");
		assert_eq!(decoded.header.kid.as_deref(), Some(fixtures::CLIENT_KEY_ID));
	}

	#[rstest]
	fn test_ec_key_signs_with_es256() {
		// Arrange
		let generated = fixtures::EcKeyPair::generate("ec-key");
		let key = SigningKey::from_jwk_set(&generated.private_jwk_set()).unwrap();

		// Act
		let token = encode(&Header::new(key.algorithm()), &claims(), key.encoding_key()).unwrap();

		// Assert
		assert_eq!(key.algorithm(), Algorithm::ES256);
		assert_eq!(key.kid(), Some("ec-key"));
		let decoding_key = generated.decoding_key();
		assert!(decode::<Claims>(&token, &decoding_key, &Validation::new(Algorithm::ES256)).is_ok());
	}

	#[rstest]
	#[case::invalid_json("not json")]
	#[case::missing_keys(r#"{}"#)]
	#[case::empty_keys(r#"{"keys":[]}"#)]
	#[case::unknown_kty(r#"{"keys":[{"kty":"oct","k":"c2VjcmV0"}]}"#)]
	#[case::rsa_missing_d(r#"{"keys":[{"kty":"RSA","n":"AQAB","e":"AQAB"}]}"#)]
	#[case::ec_wrong_curve(r#"{"keys":[{"kty":"EC","crv":"P-384","d":"AQAB"}]}"#)]
	#[case::rsa_hmac_alg(r#"{"keys":[{"kty":"RSA","alg":"HS256"}]}"#)]
	fn test_malformed_key_sets_rejected(#[case] json: &str) {
		let result = SigningKey::from_jwk_set(json);

		assert!(matches!(result, Err(OidcError::InvalidJwk(_))));
	}

	#[rstest]
	fn test_debug_hides_key_material() {
		let key = SigningKey::from_jwk_set(fixtures::CLIENT_JWK_SET).unwrap();

		let debug = format!("{:?}", key);

		assert!(debug.contains("RS256"));
		assert!(!debug.contains(fixtures::CLIENT_KEY_N));
	}
}
