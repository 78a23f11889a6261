//! PKCE, nonce and state generation

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Only supported challenge method
pub const CHALLENGE_METHOD: &str = "S256";

const TOKEN_BYTES: usize = 32;

/// Generates an unguessable base64url token carrying 256 bits of entropy
///
/// Used for `state`, `nonce` and PKCE verifiers alike.
pub fn random_token() -> String {
	let mut bytes = [0u8; TOKEN_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

/// PKCE code verifier
///
/// Stays with the client; only its [`CodeChallenge`] is sent upfront.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeVerifier(String);

impl CodeVerifier {
	/// Generates a fresh verifier
	pub fn generate() -> Self {
		Self(random_token())
	}

	/// Restores a verifier from its stored form
	pub fn from_secret(secret: impl Into<String>) -> Self {
		Self(secret.into())
	}

	/// Secret value, sent only to the token endpoint
	pub fn secret(&self) -> &str {
		&self.0
	}

	/// Derives the `S256` challenge
	pub fn challenge(&self) -> CodeChallenge {
		let digest = Sha256::digest(self.0.as_bytes());
		CodeChallenge(URL_SAFE_NO_PAD.encode(digest))
	}
}

impl std::fmt::Debug for CodeVerifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("CodeVerifier([REDACTED])")
	}
}

/// `S256` code challenge: base64url(SHA-256(verifier))
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge(String);

impl CodeChallenge {
	/// Encoded challenge
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
