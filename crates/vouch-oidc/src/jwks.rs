//! Provider JWKS cache and JWT verification

use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::OidcError;
use crate::http::HttpClient;

/// Algorithms accepted on provider-signed JWTs
pub const ACCEPTED_ALGORITHMS: [Algorithm; 9] = [
	Algorithm::RS256,
	Algorithm::RS384,
	Algorithm::RS512,
	Algorithm::PS256,
	Algorithm::PS384,
	Algorithm::PS512,
	Algorithm::ES256,
	Algorithm::ES384,
	Algorithm::EdDSA,
];

/// Shortest time between two fetches triggered by an unknown `kid`
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct KeyState {
	set: Option<JwkSet>,
	fetched_at: Option<Instant>,
}

/// Provider public keys, fetched lazily and refreshed on an unknown `kid`
///
/// Refreshes on a miss happen at most once per [`MIN_REFRESH_INTERVAL`], so
/// responses carrying made-up key ids cannot turn into a stream of requests
/// to the provider.
#[derive(Debug)]
pub struct JwksCache {
	client: HttpClient,
	jwks_uri: String,
	min_refresh_interval: Duration,
	keys: RwLock<KeyState>,
}

impl JwksCache {
	/// Creates an empty cache for `jwks_uri`
	pub fn new(client: HttpClient, jwks_uri: impl Into<String>) -> Self {
		Self {
			client,
			jwks_uri: jwks_uri.into(),
			min_refresh_interval: MIN_REFRESH_INTERVAL,
			keys: RwLock::new(KeyState::default()),
		}
	}

	/// Overrides [`MIN_REFRESH_INTERVAL`]
	pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
		self.min_refresh_interval = interval;
		self
	}

	/// Verifies `token` and returns its claims
	///
	/// The signing algorithm is pinned to the token header's, which must be
	/// one of [`ACCEPTED_ALGORITHMS`]. All other rules come from `validation`.
	pub async fn verify<T: DeserializeOwned>(
		&self,
		token: &str,
		validation: &Validation,
	) -> Result<T, OidcError> {
		let header = decode_header(token)?;
		if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
			return Err(OidcError::TokenValidation(format!(
				"Unsupported signing algorithm: {:?}",
				header.alg
			)));
		}

		let jwk = self.get_jwk(header.kid.as_deref()).await?;
		let decoding_key =
			DecodingKey::from_jwk(&jwk).map_err(|e| OidcError::InvalidJwk(e.to_string()))?;

		let mut pinned = validation.clone();
		pinned.algorithms = vec![header.alg];

		let data = decode::<T>(token, &decoding_key, &pinned).map_err(|e| {
			tracing::debug!(error = %e, "JWT verification failed");
			OidcError::from(e)
		})?;
		Ok(data.claims)
	}

	async fn get_jwk(&self, kid: Option<&str>) -> Result<Jwk, OidcError> {
		{
			let keys = self.keys.read().await;
			if let Some(jwk) = keys.set.as_ref().and_then(|set| select(set, kid)) {
				return Ok(jwk);
			}
		}

		// Misses queue here, so one fetch serves all of them
		let mut keys = self.keys.write().await;
		if let Some(jwk) = keys.set.as_ref().and_then(|set| select(set, kid)) {
			return Ok(jwk);
		}

		let throttled = keys
			.fetched_at
			.is_some_and(|at| at.elapsed() < self.min_refresh_interval);
		if throttled {
			tracing::debug!(kid = kid.unwrap_or("(none)"), "Unknown kid, JWKS refresh throttled");
		} else {
			// Miss: the provider may have rotated keys
			keys.fetched_at = Some(Instant::now());
			keys.set = Some(self.fetch().await?);
		}

		keys.set
			.as_ref()
			.and_then(|set| select(set, kid))
			.ok_or_else(|| {
				OidcError::TokenValidation(format!(
					"No key found for kid {}",
					kid.unwrap_or("(none)")
				))
			})
	}

	/// Fetches the key set and replaces the cached one
	///
	/// Not subject to the refresh interval.
	pub async fn refresh(&self) -> Result<(), OidcError> {
		let set = self.fetch().await?;
		let mut keys = self.keys.write().await;
		keys.set = Some(set);
		keys.fetched_at = Some(Instant::now());
		Ok(())
	}

	async fn fetch(&self) -> Result<JwkSet, OidcError> {
		tracing::debug!(url = %self.jwks_uri, "Fetching provider JWKS");

		let response = self
			.client
			.client()
			.get(&self.jwks_uri)
			.send()
			.await
			.map_err(|e| OidcError::Jwks(format!("Failed to fetch JWKS: {}", e)))?;

		if !response.status().is_success() {
			return Err(OidcError::Jwks(format!(
				"JWKS request returned status {}",
				response.status()
			)));
		}

		let set: JwkSet = response
			.json()
			.await
			.map_err(|e| OidcError::Jwks(format!("Failed to parse JWKS: {}", e)))?;

		tracing::debug!(keys = set.keys.len(), "Provider JWKS refreshed");
		Ok(set)
	}
}

fn select(set: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
	match kid {
		Some(kid) => set.find(kid).cloned(),
		// Without a kid, only an unambiguous single-key set is usable
		None if set.keys.len() == 1 => set.keys.first().cloned(),
		None => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn key_set(kids: &[&str]) -> JwkSet {
		let keys = kids
			.iter()
			.map(|kid| {
				serde_json::json!({
					"kty": "RSA",
					"kid": kid,
					"n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
					"e": "AQAB"
				})
			})
			.collect::<Vec<_>>();
		serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap()
	}

	#[rstest]
	#[case(&["a", "b"], Some("b"), Some("b"))]
	#[case(&["a", "b"], Some("c"), None)]
	#[case(&["a"], None, Some("a"))]
	#[case(&["a", "b"], None, None)]
	fn test_select_key(
		#[case] kids: &[&str],
		#[case] kid: Option<&str>,
		#[case] expected: Option<&str>,
	) {
		let set = key_set(kids);

		let selected = select(&set, kid);

		assert_eq!(
			selected.and_then(|jwk| jwk.common.key_id),
			expected.map(String::from)
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unreachable_jwks_is_jwks_error() {
		// Arrange
		let cache = JwksCache::new(HttpClient::new(), "http://127.0.0.1:9/jwks");

		// Act
		let result = cache.refresh().await;

		// Assert
		assert!(matches!(result, Err(OidcError::Jwks(_))));
	}
}
