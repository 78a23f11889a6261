//! Cache error types

use thiserror::Error;

/// Result alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
	/// Value could not be encoded or decoded
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// The backing store failed
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<serde_json::Error> for CacheError {
	fn from(error: serde_json::Error) -> Self {
		CacheError::Serialization(error.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_display() {
		let error = CacheError::Backend("connection refused".to_string());
		assert_eq!(error.to_string(), "Backend error: connection refused");
	}

	#[test]
	fn test_error_from_serde_json() {
		let json_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
		let error: CacheError = json_error.into();

		assert!(matches!(error, CacheError::Serialization(_)));
	}
}
