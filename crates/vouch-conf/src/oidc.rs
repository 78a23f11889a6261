//! Validated OIDC client settings

use std::fmt;

use url::Url;

use crate::error::ConfigError;
use crate::sources::SettingsSource;

/// Setting names and defaults
pub mod names {
	/// Identity provider base URL (optional)
	pub const PROVIDER_URL: &str = "NUGGETS_OIDC_PROVIDER_URL";
	/// OAuth client identifier (required)
	pub const CLIENT_ID: &str = "NUGGETS_OIDC_CLIENT_ID";
	/// Client signing keys as a JWK Set JSON document (required)
	pub const PRIVATE_KEY: &str = "NUGGETS_OIDC_PRIVATE_KEY";
	/// Externally reachable base URL of this service (optional)
	pub const SERVER_URL: &str = "SERVER_URL";
	/// Externally reachable port of this service (optional)
	pub const SERVER_PORT: &str = "SERVER_PORT";

	/// Provider used when [`PROVIDER_URL`] is not set
	pub const DEFAULT_PROVIDER_URL: &str = "https://auth-dev.internal-nuggets.life";
	/// Base URL used when [`SERVER_URL`] is not set
	pub const DEFAULT_SERVER_URL: &str = "http://localhost";
}

/// Path of the callback endpoint, relative to the server base URL
pub const CALLBACK_PATH: &str = "/api/oidc/callback";

/// OIDC client settings
///
/// # Examples
///
/// ```
/// use vouch_conf::{MemorySettings, OidcSettings, names};
///
/// let source = MemorySettings::new()
/// 	.with(names::CLIENT_ID, "agent-client")
/// 	.with(names::PRIVATE_KEY, r#"{"keys":[]}"#)
/// 	.with(names::SERVER_URL, "https://agent.example.com")
/// 	.with(names::SERVER_PORT, "8443");
///
/// let settings = OidcSettings::from_source(&source).unwrap();
/// assert_eq!(settings.provider_url, names::DEFAULT_PROVIDER_URL);
/// assert_eq!(
/// 	settings.redirect_uri(),
/// 	"https://agent.example.com:8443/api/oidc/callback"
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OidcSettings {
	/// Provider base URL, without a trailing slash
	pub provider_url: String,
	/// OAuth client identifier
	pub client_id: String,
	/// JWK Set JSON holding the client signing key
	pub private_key_set: String,
	/// Base URL of this service, without a trailing slash
	pub server_url: String,
	/// Port of this service, if configured separately from the base URL
	pub server_port: Option<u16>,
}

impl OidcSettings {
	/// Reads and validates settings from `source`
	///
	/// Every problem found is reported at once in a
	/// [`ConfigError::Validation`], one `NAME: reason` line each.
	pub fn from_source(source: &dyn SettingsSource) -> Result<Self, ConfigError> {
		let mut problems = Vec::new();

		let provider_url = source
			.get_setting(names::PROVIDER_URL)
			.unwrap_or_else(|| names::DEFAULT_PROVIDER_URL.to_string());
		let provider_url = match parse_base_url(&provider_url) {
			Ok(url) => url,
			Err(reason) => {
				problems.push(format!("{}: {}", names::PROVIDER_URL, reason));
				String::new()
			}
		};

		let client_id = source.get_setting(names::CLIENT_ID).unwrap_or_else(|| {
			problems.push(format!("{}: required", names::CLIENT_ID));
			String::new()
		});

		let private_key_set = source.get_setting(names::PRIVATE_KEY).unwrap_or_else(|| {
			problems.push(format!("{}: required", names::PRIVATE_KEY));
			String::new()
		});

		let server_url = source
			.get_setting(names::SERVER_URL)
			.unwrap_or_else(|| names::DEFAULT_SERVER_URL.to_string());
		let server_url = match parse_base_url(&server_url) {
			Ok(url) => url,
			Err(reason) => {
				problems.push(format!("{}: {}", names::SERVER_URL, reason));
				String::new()
			}
		};

		let server_port = match source.get_setting(names::SERVER_PORT) {
			None => None,
			Some(raw) => match raw.trim().parse::<u16>() {
				Ok(port) if port > 0 => Some(port),
				_ => {
					problems.push(format!("{}: not a port number: {}", names::SERVER_PORT, raw));
					None
				}
			},
		};

		if !problems.is_empty() {
			tracing::warn!(count = problems.len(), "OIDC settings failed validation");
			return Err(ConfigError::Validation(problems.join("\n")));
		}

		Ok(Self {
			provider_url,
			client_id,
			private_key_set,
			server_url,
			server_port,
		})
	}

	/// Fixed redirect URI registered with the provider
	pub fn redirect_uri(&self) -> String {
		match self.server_port {
			Some(port) => format!("{}:{}{}", self.server_url, port, CALLBACK_PATH),
			None => format!("{}{}", self.server_url, CALLBACK_PATH),
		}
	}
}

impl fmt::Debug for OidcSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OidcSettings")
			.field("provider_url", &self.provider_url)
			.field("client_id", &self.client_id)
			.field("private_key_set", &"[REDACTED]")
			.field("server_url", &self.server_url)
			.field("server_port", &self.server_port)
			.finish()
	}
}

fn parse_base_url(raw: &str) -> Result<String, String> {
	let trimmed = raw.trim().trim_end_matches('/');
	let url = Url::parse(trimmed).map_err(|e| format!("not a valid URL: {}", e))?;
	match url.scheme() {
		"http" | "https" => Ok(trimmed.to_string()),
		other => Err(format!("unsupported scheme: {}", other)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::MemorySettings;
	use rstest::rstest;

	fn complete_source() -> MemorySettings {
		MemorySettings::new()
			.with(names::CLIENT_ID, "agent-client")
			.with(names::PRIVATE_KEY, r#"{"keys":[{"kty":"EC"}]}"#)
	}

	#[rstest]
	fn test_defaults_applied() {
		// Arrange
		let source = complete_source();

		// Act
		let settings = OidcSettings::from_source(&source).unwrap();

		// Assert
		assert_eq!(settings.provider_url, names::DEFAULT_PROVIDER_URL);
		assert_eq!(settings.server_url, names::DEFAULT_SERVER_URL);
		assert_eq!(settings.server_port, None);
		assert_eq!(settings.redirect_uri(), "http://localhost/api/oidc/callback");
	}

	#[rstest]
	#[case("https://agent.example.com", Some("3000"), "https://agent.example.com:3000/api/oidc/callback")]
	#[case("https://agent.example.com/", None, "https://agent.example.com/api/oidc/callback")]
	#[case("http://localhost", Some("8080"), "http://localhost:8080/api/oidc/callback")]
	fn test_redirect_uri(
		#[case] server_url: &str,
		#[case] port: Option<&str>,
		#[case] expected: &str,
	) {
		// Arrange
		let source = complete_source().with(names::SERVER_URL, server_url);
		if let Some(port) = port {
			source.set(names::SERVER_PORT, port);
		}

		// Act
		let settings = OidcSettings::from_source(&source).unwrap();

		// Assert
		assert_eq!(settings.redirect_uri(), expected);
	}

	#[rstest]
	fn test_provider_url_trailing_slash_trimmed() {
		let source = complete_source().with(names::PROVIDER_URL, "https://idp.example.com/");

		let settings = OidcSettings::from_source(&source).unwrap();

		assert_eq!(settings.provider_url, "https://idp.example.com");
	}

	#[rstest]
	fn test_reports_all_missing_settings_together() {
		// Arrange
		let source = MemorySettings::new();

		// Act
		let result = OidcSettings::from_source(&source);

		// Assert
		let Err(ConfigError::Validation(message)) = result else {
			panic!("expected validation error, got {:?}", result);
		};
		assert!(message.contains("NUGGETS_OIDC_CLIENT_ID: required"));
		assert!(message.contains("NUGGETS_OIDC_PRIVATE_KEY: required"));
		assert_eq!(message.lines().count(), 2);
	}

	#[rstest]
	#[case(names::PROVIDER_URL, "not a url")]
	#[case(names::PROVIDER_URL, "ftp://idp.example.com")]
	#[case(names::SERVER_URL, "::::")]
	#[case(names::SERVER_PORT, "70000")]
	#[case(names::SERVER_PORT, "http")]
	fn test_invalid_values_rejected(#[case] name: &str, #[case] value: &str) {
		let source = complete_source().with(name, value);

		let result = OidcSettings::from_source(&source);

		let Err(ConfigError::Validation(message)) = result else {
			panic!("expected validation error, got {:?}", result);
		};
		assert!(message.starts_with(name));
	}

	#[rstest]
	fn test_debug_redacts_private_key() {
		let settings = OidcSettings::from_source(&complete_source()).unwrap();

		let debug = format!("{:?}", settings);

		assert!(debug.contains("[REDACTED]"));
		assert!(!debug.contains("kty"));
	}
}
