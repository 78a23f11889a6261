//! UserInfo responses

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Media type of signed userinfo responses
pub const JWT_CONTENT_TYPE: &str = "application/jwt";

/// Claims returned by the userinfo endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Subject
	pub sub: String,
	/// All other claims, including any verified-claim proof
	#[serde(flatten)]
	pub claims: Map<String, Value>,
}

impl UserInfo {
	/// Looks up a claim by JSON pointer, e.g. `/proof/credentialSubject/type`
	pub fn pointer(&self, pointer: &str) -> Option<&Value> {
		let mut segments = pointer.strip_prefix('/')?.splitn(2, '/');
		let first = segments.next()?;
		let value = self.claims.get(first)?;
		match segments.next() {
			Some(rest) => value.pointer(&format!("/{}", rest)),
			None => Some(value),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_pointer_lookup() {
		let info: UserInfo = serde_json::from_value(serde_json::json!({
			"sub": "did:example:1",
			"proof": {"credentialSubject": {"type": "Person", "over18": "true"}}
		}))
		.unwrap();

		assert_eq!(
			info.pointer("/proof/credentialSubject/type"),
			Some(&Value::from("Person"))
		);
		assert!(info.pointer("/proof").is_some());
		assert!(info.pointer("/missing/x").is_none());
		assert!(info.pointer("no-slash").is_none());
	}
}
