//! Configuration error types

use thiserror::Error;

/// Configuration errors
///
/// These are startup-class failures: nothing can proceed until the settings
/// are fixed, and retrying does not help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	/// A required setting is absent or empty
	#[error("Missing setting: {0}")]
	Missing(String),

	/// A setting is present but unusable
	#[error("Invalid setting {name}: {reason}")]
	Invalid { name: String, reason: String },

	/// Several settings failed validation at once
	#[error("Configuration validation failed:\n{0}")]
	Validation(String),
}
