//! Pending flow records

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ConversationContext;

/// Lifetime of a pending flow
pub const FLOW_TTL: Duration = Duration::from_secs(120);

/// Secrets and context of one in-flight flow, keyed by its transmitted state
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFlow {
	/// ID token nonce
	pub nonce: String,
	/// PKCE code verifier
	pub code_verifier: String,
	/// Full requested scope, including `openid`
	pub scope: String,
	/// Conversation to resume
	#[serde(flatten)]
	pub context: ConversationContext,
}

impl PendingFlow {
	/// Whether only authentication was requested
	pub fn is_auth_only(&self) -> bool {
		self.scope.trim_end() == "openid"
	}
}

impl std::fmt::Debug for PendingFlow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingFlow")
			.field("scope", &self.scope)
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use uuid::Uuid;

	fn flow(scope: &str) -> PendingFlow {
		PendingFlow {
			nonce: "nonce".to_string(),
			code_verifier: "verifier".to_string(),
			scope: scope.to_string(),
			context: ConversationContext::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
		}
	}

	#[rstest]
	#[case("openid ", true)]
	#[case("openid", true)]
	#[case("openid over18", false)]
	fn test_is_auth_only(#[case] scope: &str, #[case] expected: bool) {
		assert_eq!(flow(scope).is_auth_only(), expected);
	}

	#[rstest]
	fn test_serialized_shape() {
		let pending = flow("openid over18");

		let value = serde_json::to_value(&pending).unwrap();

		assert_eq!(value["codeVerifier"], "verifier");
		assert_eq!(value["agentId"], pending.context.agent_id.to_string());
		assert!(value.get("context").is_none());
	}

	#[rstest]
	fn test_debug_hides_secrets() {
		let debug = format!("{:?}", flow("openid "));

		assert!(!debug.contains("verifier"));
		assert!(!debug.contains("nonce"));
	}
}
