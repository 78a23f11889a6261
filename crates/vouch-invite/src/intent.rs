//! Keyword intent table
//!
//! One row per verification the agent can offer. Text is matched against
//! each row's keywords and the best-scoring row wins.

use crate::scope::VerificationScope;

/// One verification action the agent can offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
	/// Action label
	pub label: &'static str,
	/// Scope requested when the action runs
	pub scope: VerificationScope,
	/// Lowercase keywords; entries containing a space match as phrases
	pub keywords: &'static [&'static str],
	/// Message sent alongside the link
	pub reply: &'static str,
	/// Title of the link attachment
	pub link_title: &'static str,
}

impl Intent {
	/// Number of keywords present in already-lowercased `text`
	fn score(&self, text: &str, words: &[&str]) -> usize {
		self.keywords
			.iter()
			.filter(|keyword| {
				if keyword.contains(' ') {
					text.contains(*keyword)
				} else {
					words.contains(keyword)
				}
			})
			.count()
	}
}

/// Ordered set of intents
#[derive(Debug, Clone)]
pub struct IntentTable {
	intents: Vec<Intent>,
}

impl IntentTable {
	/// Creates a table from `intents`, in priority order
	pub fn new(intents: Vec<Intent>) -> Self {
		Self { intents }
	}

	/// All intents, in priority order
	pub fn intents(&self) -> &[Intent] {
		&self.intents
	}

	/// Looks an intent up by label
	pub fn get(&self, label: &str) -> Option<&Intent> {
		self.intents.iter().find(|intent| intent.label == label)
	}

	/// Picks the intent whose keywords best match `text`
	///
	/// Returns `None` when no keyword occurs. Ties go to the earlier row.
	///
	/// # Examples
	///
	/// ```
	/// use vouch_invite::{IntentTable, VerificationScope};
	///
	/// let table = IntentTable::default();
	/// let intent = table.match_text("Can you verify my GitHub account?").unwrap();
	/// assert_eq!(intent.scope, VerificationScope::SocialGithub);
	/// ```
	pub fn match_text(&self, text: &str) -> Option<&Intent> {
		let text = text.to_lowercase();
		let words: Vec<&str> = text
			.split(|c: char| !c.is_alphanumeric())
			.filter(|w| !w.is_empty())
			.collect();

		let mut best: Option<(&Intent, usize)> = None;
		for intent in &self.intents {
			let score = intent.score(&text, &words);
			if score > 0 && best.is_none_or(|(_, top)| score > top) {
				best = Some((intent, score));
			}
		}
		best.map(|(intent, _)| intent)
	}
}

impl Default for IntentTable {
	fn default() -> Self {
		Self::new(vec![
			Intent {
				label: "AUTHENTICATE_USER",
				scope: VerificationScope::Authenticate,
				keywords: &["authenticate", "auth", "account", "connect"],
				reply: "Here's an authentication link for you:",
				link_title: "Authenticate with Nuggets",
			},
			Intent {
				label: "VERIFY_USER_OVER_18",
				scope: VerificationScope::Over18,
				keywords: &["verify", "over", "18", "age"],
				reply: "Here's an age verification link for you:",
				link_title: "Verify Age with Nuggets",
			},
			Intent {
				label: "VERIFY_FULL_NAME",
				scope: VerificationScope::Profile,
				keywords: &["verify", "name", "full name", "fullname"],
				reply: "Here's a name verification link for you:",
				link_title: "Verify Name with Nuggets",
			},
			Intent {
				label: "VERIFY_TWITTER_ACCOUNT",
				scope: VerificationScope::SocialTwitter,
				keywords: &["verify", "twitter", "x", "account", "social"],
				reply: "Here's an X (Twitter) verification link for you:",
				link_title: "Verify Twitter (X) account with Nuggets",
			},
			Intent {
				label: "VERIFY_GITHUB_ACCOUNT",
				scope: VerificationScope::SocialGithub,
				keywords: &["verify", "github", "account", "social"],
				reply: "Here's a Github verification link for you:",
				link_title: "Verify Github account with Nuggets",
			},
		])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("I want to authenticate my account", "AUTHENTICATE_USER")]
	#[case("Am I over 18? Check my age", "VERIFY_USER_OVER_18")]
	#[case("I want to verify my full name", "VERIFY_FULL_NAME")]
	#[case("Verify my Twitter account please", "VERIFY_TWITTER_ACCOUNT")]
	#[case("verify control of my x account", "VERIFY_TWITTER_ACCOUNT")]
	#[case("How do I prove I control a GitHub account?", "VERIFY_GITHUB_ACCOUNT")]
	fn test_match_text(#[case] text: &str, #[case] expected: &str) {
		// Arrange
		let table = IntentTable::default();

		// Act
		let intent = table.match_text(text);

		// Assert
		assert_eq!(intent.map(|i| i.label), Some(expected));
	}

	#[rstest]
	fn test_single_word_keywords_match_whole_words() {
		// Arrange
		let table = IntentTable::default();

		// Act
		// "x" inside "next" and "auth" inside "author" must not count
		let intent = table.match_text("next author");

		// Assert
		assert!(intent.is_none());
	}

	#[rstest]
	fn test_tie_goes_to_earlier_row() {
		// Arrange
		let table = IntentTable::default();

		// Act
		let intent = table.match_text("verify");

		// Assert
		assert_eq!(intent.unwrap().label, "VERIFY_USER_OVER_18");
	}

	#[rstest]
	fn test_no_match() {
		// Arrange
		let table = IntentTable::default();

		// Act & Assert
		assert!(table.match_text("hello there").is_none());
		assert!(table.match_text("").is_none());
	}

	#[rstest]
	fn test_get_by_label() {
		// Arrange
		let table = IntentTable::default();

		// Act
		let intent = table.get("VERIFY_FULL_NAME").unwrap();

		// Assert
		assert_eq!(intent.scope, VerificationScope::Profile);
		assert_eq!(table.intents().len(), 5);
		assert!(table.get("UNKNOWN").is_none());
	}
}
