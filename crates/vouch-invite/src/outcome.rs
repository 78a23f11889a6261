//! Callback outcomes and their normalization
//!
//! Userinfo proofs arrive as free-form JSON. [`classify`] maps them onto the
//! closed [`OutcomeKind`] set; anything unrecognized becomes
//! [`OutcomeKind::Unknown`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use vouch_oidc::UserInfo;

/// Location of the credential subject inside userinfo
const CREDENTIAL_SUBJECT: &str = "/proof/credentialSubject";

/// Verified result of one completed flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackOutcome {
	/// Verified subject identifier
	pub sub: String,
	/// Correlation reference handed out with the invite
	#[serde(rename = "ref")]
	pub reference: String,
	/// What was proven
	#[serde(flatten)]
	pub kind: OutcomeKind,
}

/// Proof kinds, tagged by the provider's credential type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutcomeKind {
	/// Authentication only
	Auth,
	/// Person credential: age and/or name
	Person(PersonProof),
	/// Twitter (X) account control
	Twitter(SocialAccountProof),
	/// Github account control
	Github(SocialAccountProof),
	/// Unrecognized credential type
	#[serde(rename = "unknown")]
	Unknown,
}

impl OutcomeKind {
	/// Wire name of the kind
	pub fn name(&self) -> &'static str {
		match self {
			OutcomeKind::Auth => "Auth",
			OutcomeKind::Person(_) => "Person",
			OutcomeKind::Twitter(_) => "Twitter",
			OutcomeKind::Github(_) => "Github",
			OutcomeKind::Unknown => "unknown",
		}
	}
}

/// Fields of a person credential; absent claims stay absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProof {
	/// Given name
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_none")]
	pub given_name: Option<String>,
	/// Family name
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_none")]
	pub family_name: Option<String>,
	/// Over-18 result, `"true"` or `"false"`
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		deserialize_with = "bool_or_string"
	)]
	pub over18: Option<String>,
}

/// Fields of a social account credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountProof {
	/// Profile URL
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_none")]
	pub url: Option<String>,
	/// Account handle
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_none")]
	pub username: Option<String>,
	/// Avatar URL
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_none")]
	pub profile_image: Option<String>,
}

// Claims of the wrong JSON type are dropped one by one, keeping the rest
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::String(s)) => Some(s),
		_ => None,
	})
}

fn bool_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::Bool(b)) => Some(b.to_string()),
		Some(Value::String(s)) if !s.is_empty() => Some(s),
		_ => None,
	})
}

/// Maps a userinfo payload to an outcome kind
///
/// Authentication-only flows are always [`OutcomeKind::Auth`], whatever the
/// payload says. Otherwise the credential subject's `type` decides.
pub fn classify(auth_only: bool, info: &UserInfo) -> OutcomeKind {
	if auth_only {
		return OutcomeKind::Auth;
	}

	let Some(subject) = info.pointer(CREDENTIAL_SUBJECT) else {
		return OutcomeKind::Unknown;
	};

	match subject.get("type").and_then(Value::as_str) {
		Some("Person") => OutcomeKind::Person(project(subject)),
		Some("Twitter") => OutcomeKind::Twitter(project(subject)),
		Some("Github") => OutcomeKind::Github(project(subject)),
		_ => OutcomeKind::Unknown,
	}
}

fn project<T: serde::de::DeserializeOwned + Default>(subject: &Value) -> T {
	T::deserialize(subject).unwrap_or_else(|e| {
		tracing::warn!(error = %e, "Ignoring malformed credential subject");
		T::default()
	})
}

impl CallbackOutcome {
	/// Builds an outcome from verified userinfo
	pub fn from_user_info(reference: impl Into<String>, auth_only: bool, info: &UserInfo) -> Self {
		Self {
			sub: info.sub.clone(),
			reference: reference.into(),
			kind: classify(auth_only, info),
		}
	}

	/// User-facing sentence describing the outcome
	pub fn summary(&self) -> String {
		let authenticated = || format!("You have successfully authenticated as {}", self.sub);

		match &self.kind {
			OutcomeKind::Person(person) => {
				if let Some(over18) = &person.over18 {
					let verdict = if over18 == "true" { "passed" } else { "failed" };
					return format!("You have {} over-18 verification", verdict);
				}
				if let Some(family_name) = &person.family_name {
					let name = match &person.given_name {
						Some(given_name) => format!("{} {}", given_name, family_name),
						None => family_name.clone(),
					};
					return format!("You have verified your name as: {}", name);
				}
				authenticated()
			}
			OutcomeKind::Twitter(account) => format!(
				"You have verified control of the following Twitter (X) account: @{}",
				account.username.as_deref().unwrap_or_default()
			),
			OutcomeKind::Github(account) => format!(
				"You have verified control of the following Github account: @{}",
				account.username.as_deref().unwrap_or_default()
			),
			OutcomeKind::Auth | OutcomeKind::Unknown => authenticated(),
		}
	}
}
