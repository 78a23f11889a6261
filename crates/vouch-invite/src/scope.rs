//! Verification scopes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InviteError;

/// What the user is asked to prove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationScope {
	/// Authentication only
	Authenticate,
	/// Age over 18
	Over18,
	/// Legal name
	Profile,
	/// Right to work
	RightToWork,
	/// Control of a Twitter (X) account
	SocialTwitter,
	/// Control of a Github account
	SocialGithub,
	/// Know your business
	Kyb,
}

impl VerificationScope {
	/// All supported scopes
	pub const ALL: [VerificationScope; 7] = [
		VerificationScope::Authenticate,
		VerificationScope::Over18,
		VerificationScope::Profile,
		VerificationScope::RightToWork,
		VerificationScope::SocialTwitter,
		VerificationScope::SocialGithub,
		VerificationScope::Kyb,
	];

	/// Scope value as sent to the provider, without `openid`
	pub fn as_str(&self) -> &'static str {
		match self {
			VerificationScope::Authenticate => "",
			VerificationScope::Over18 => "over18",
			VerificationScope::Profile => "profile",
			VerificationScope::RightToWork => "rightToWork",
			VerificationScope::SocialTwitter => "social:twitter",
			VerificationScope::SocialGithub => "social:github",
			VerificationScope::Kyb => "kyb",
		}
	}

	/// Full requested scope: `"openid "` followed by the scope value
	///
	/// Authentication-only yields exactly `"openid "`.
	pub fn requested_scope(&self) -> String {
		format!("openid {}", self.as_str())
	}
}

impl fmt::Display for VerificationScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for VerificationScope {
	type Err = InviteError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		VerificationScope::ALL
			.into_iter()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| InviteError::UnknownScope(s.to_string()))
	}
}

impl TryFrom<String> for VerificationScope {
	type Error = InviteError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<VerificationScope> for String {
	fn from(scope: VerificationScope) -> Self {
		scope.as_str().to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(VerificationScope::Authenticate, "openid ")]
	#[case(VerificationScope::Over18, "openid over18")]
	#[case(VerificationScope::Profile, "openid profile")]
	#[case(VerificationScope::RightToWork, "openid rightToWork")]
	#[case(VerificationScope::SocialTwitter, "openid social:twitter")]
	#[case(VerificationScope::SocialGithub, "openid social:github")]
	#[case(VerificationScope::Kyb, "openid kyb")]
	fn test_requested_scope(#[case] scope: VerificationScope, #[case] expected: &str) {
		assert_eq!(scope.requested_scope(), expected);
	}

	#[rstest]
	#[case("", VerificationScope::Authenticate)]
	#[case("over18", VerificationScope::Over18)]
	#[case(" social:github ", VerificationScope::SocialGithub)]
	fn test_parse(#[case] input: &str, #[case] expected: VerificationScope) {
		assert_eq!(input.parse::<VerificationScope>().unwrap(), expected);
	}

	#[rstest]
	#[case("admin")]
	#[case("openid")]
	#[case("Over18")]
	fn test_parse_rejects_unknown(#[case] input: &str) {
		assert!(matches!(
			input.parse::<VerificationScope>(),
			Err(InviteError::UnknownScope(_))
		));
	}

	#[rstest]
	fn test_serde_uses_wire_value() {
		let json = serde_json::to_string(&VerificationScope::RightToWork).unwrap();
		assert_eq!(json, r#""rightToWork""#);

		let scope: VerificationScope = serde_json::from_str(r#""social:twitter""#).unwrap();
		assert_eq!(scope, VerificationScope::SocialTwitter);
	}
}
