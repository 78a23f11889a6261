//! Key fixtures

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use serde::Serialize;

/// Client identifier registered with the mock provider
pub const CLIENT_ID: &str = "agent-client";

/// `kid` of the client signing key
pub const CLIENT_KEY_ID: &str = "Gu7GtAnW9KlV9EBCBvukekpQGCcBmulzPmeAvfznGUA";

/// Modulus of the client signing key (base64url)
pub const CLIENT_KEY_N: &str = "hRdHm5-KCes746F_sHylRu3mhQbOYSX-A9Wj7416QOT1F8MIW1IjK-cJ4ER9E6OuZ8knpqLhwYdcgSqmDyogizzl1BmZScTkUaSoTi51F_jFNaQNz6BTXOhcmXTI7ApQM88BZJy01jmuN8bRgFxpzYlu-046E53r_7o9vSVXDYFpBV3BZfXFzQaSC33aVUuV9IpmCzeKx6_zNc-R56ralJ4ull4hbDl3ETsVPvAvdFcUdAMSYkWOYjV5bdBPIxW2X9POeB-lf-xvgcUataL-io38W9VKNgYZBY74PXM50VMSMP_ULmJ9EXxDL5Y0-ZngoTqCIZ0roTz92jupFZWpww";

/// Public exponent of the client signing key (base64url)
pub const CLIENT_KEY_E: &str = "AQAB";

/// Private JWK Set holding the client's RS256 signing key
pub const CLIENT_JWK_SET: &str = r#"{"keys":[{"kty":"RSA","kid":"Gu7GtAnW9KlV9EBCBvukekpQGCcBmulzPmeAvfznGUA","use":"sig","alg":"RS256","e":"AQAB","n":"hRdHm5-KCes746F_sHylRu3mhQbOYSX-A9Wj7416QOT1F8MIW1IjK-cJ4ER9E6OuZ8knpqLhwYdcgSqmDyogizzl1BmZScTkUaSoTi51F_jFNaQNz6BTXOhcmXTI7ApQM88BZJy01jmuN8bRgFxpzYlu-046E53r_7o9vSVXDYFpBV3BZfXFzQaSC33aVUuV9IpmCzeKx6_zNc-R56ralJ4ull4hbDl3ETsVPvAvdFcUdAMSYkWOYjV5bdBPIxW2X9POeB-lf-xvgcUataL-io38W9VKNgYZBY74PXM50VMSMP_ULmJ9EXxDL5Y0-ZngoTqCIZ0roTz92jupFZWpww","d":"CxbL-Br8YOQxKr-3iGhySu0igl31TyHfvskLrjd_Aq4w_6hX52f6FzvaVk3OkBbYvrwDaj5zCfFx0y9PA79yU7egvKHfZEab8XODNHRpfDRVlikTn4OPvpN7t6uD3Crl0NNEHfJynNDUg8A0j3njtOTpEtZLP3wugDGv2DUmwjCx4YJnJeUy-UIxoGhGbEBfKkwX7ivUPcvDLfhJJh_4UcrRsT20IVh_xlss-e8d7tG4zoI3tlcFqskRyo89EFqKNh_uv0ClaXHyEYrii5yYqLTh8IJoelTGY0yBD392BmUZ5mApymRfvgT2sqC5oWiryaXFSo__yXmeAlm4KMu2EQ","p":"uPQNbxCsF77Dsl1neSJCQcPFK0glfvYi8zV8hUs2a7Gfsn_40wKv_a01oHdIPXxOspQwvFQDpvQyCdkfb-hL6zuwtm_bgVzMdIonmP4zetXz8iVdtbo-cW_-wMMG9XOhBixNkTCyoGPrJmY62LEDEQLTU2DkhVZH6E0eF-4pH5M","q":"uDcuZR5xXy2wF1MMANT0Hlyj1rn8lAdfDoAadPmapQv2a_ULQHBmMJDpzbXQISKkMHMfzG4w1q2rFTWczPb35ik3kF6-zPSf38yyY3pLbQwU9ULx5WoR7dtsPcKk1E0L4f1VN1yRl-IoshoXcIfFqRcTMjTbs3fH-_qBGOyLyxE","dp":"CIAO7f_SKPU3gUcRrluIuAULVsXmE0O0r4DRzD58rc5oDIgdI3WIKRyAznMs-sZvx31QEBe8Yzvt4M39x-LhOlpv8LKLYBKnwuNmln14WDjlEUfuWp_IpuYCy1ErTLSXvfTjS7z1OLHe6NDh-3uHLIz4sWhOmGIyw9Znf6oOcck","dq":"Dbm20DvzcIcD7sj2RP2Y7sYyQuZ6pkDiWT88OWj7l76LbsHEQ9ncE1RIx1X7muxs1VtOjDnNk8E-1Qa4lyDzmYeKp0wX5Ud4vgEPbZAIHKjgyuFhCpnbmiBWMUfWZicTcpQgjE5uXqWwKIz_IBhNpuqcOIptsDKFiQXCJqxBQjE","qi":"SqKnIR9Z7GNsT0xd0SXMi2SqDPImwVhrO4H1MoDwUq_ie1NQk-YCd-SaiMUqMfhX4QRGPDT3heNYu9upeaotm6psc8OTRqslRS4JnnQy5f5G1-NbsQ9u_POgTy2OCPGm7YFF2YhR2IiRS-2tKksXaECUx7ULJqH4OBaBrAo-ohE"}]}"#;

/// Decoding key for assertions signed with [`CLIENT_JWK_SET`]
pub fn client_decoding_key() -> DecodingKey {
	DecodingKey::from_rsa_components(CLIENT_KEY_N, CLIENT_KEY_E)
		.expect("fixture RSA components are valid")
}

/// Freshly generated P-256 key pair
#[derive(Clone)]
pub struct EcKeyPair {
	kid: String,
	secret: p256::SecretKey,
}

impl EcKeyPair {
	/// Generates a key pair identified by `kid`
	pub fn generate(kid: impl Into<String>) -> Self {
		Self {
			kid: kid.into(),
			secret: p256::SecretKey::random(&mut rand::rngs::OsRng),
		}
	}

	/// Key identifier
	pub fn kid(&self) -> &str {
		&self.kid
	}

	fn coordinates(&self) -> (String, String) {
		let point = self.secret.public_key().to_encoded_point(false);
		let x = point.x().expect("uncompressed point has x");
		let y = point.y().expect("uncompressed point has y");
		(URL_SAFE_NO_PAD.encode(x), URL_SAFE_NO_PAD.encode(y))
	}

	/// Public JWK
	pub fn public_jwk(&self) -> serde_json::Value {
		let (x, y) = self.coordinates();
		serde_json::json!({
			"kty": "EC",
			"crv": "P-256",
			"kid": self.kid,
			"use": "sig",
			"alg": "ES256",
			"x": x,
			"y": y,
		})
	}

	/// Public JWK Set JSON
	pub fn public_jwk_set(&self) -> String {
		serde_json::json!({ "keys": [self.public_jwk()] }).to_string()
	}

	/// Private JWK Set JSON, usable as a client key
	pub fn private_jwk_set(&self) -> String {
		let mut jwk = self.public_jwk();
		jwk["d"] = URL_SAFE_NO_PAD.encode(self.secret.to_bytes()).into();
		serde_json::json!({ "keys": [jwk] }).to_string()
	}

	/// Signing key
	pub fn encoding_key(&self) -> EncodingKey {
		let der = self
			.secret
			.to_pkcs8_der()
			.expect("P-256 key encodes as PKCS#8");
		EncodingKey::from_ec_der(der.as_bytes())
	}

	/// Verification key
	pub fn decoding_key(&self) -> DecodingKey {
		let (x, y) = self.coordinates();
		DecodingKey::from_ec_components(&x, &y).expect("P-256 coordinates are valid")
	}

	/// Signs `claims` as an ES256 JWT carrying this key's `kid`
	pub fn sign<T: Serialize>(&self, claims: &T) -> String {
		let mut header = Header::new(Algorithm::ES256);
		header.kid = Some(self.kid.clone());
		encode(&header, claims, &self.encoding_key()).expect("ES256 signing succeeds")
	}
}

impl std::fmt::Debug for EcKeyPair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EcKeyPair")
			.field("kid", &self.kid)
			.finish_non_exhaustive()
	}
}
