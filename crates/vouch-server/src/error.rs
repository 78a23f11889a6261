//! HTTP-facing errors

use hyper::StatusCode;
use thiserror::Error;
use vouch_invite::{CallbackError, InviteError};

/// Text shown when a callback cannot be matched to a live flow
pub const REJECTED_MESSAGE: &str = "This verification link is invalid or has expired.";

/// Text shown when the provider or a collaborator failed
pub const UPSTREAM_MESSAGE: &str = "Verification could not be completed. Please try again later.";

/// Request handling errors, each mapped to one status code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
	/// Malformed request or rejected callback
	#[error("{0}")]
	BadRequest(String),

	/// No route for the path
	#[error("Not found")]
	NotFound,

	/// Route exists but not for this method
	#[error("Method not allowed")]
	MethodNotAllowed,

	/// Body exceeds the configured limit
	#[error("Request body too large")]
	PayloadTooLarge,

	/// Identity provider, cache or delivery failed
	#[error("Upstream error: {0}")]
	Upstream(String),
}

impl ServerError {
	/// Status code sent for this error
	pub fn status(&self) -> StatusCode {
		match self {
			ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::NotFound => StatusCode::NOT_FOUND,
			ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
			ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
			ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
		}
	}

	/// Message safe to show to the client
	///
	/// Upstream details stay in the logs.
	pub fn public_message(&self) -> String {
		match self {
			ServerError::Upstream(_) => UPSTREAM_MESSAGE.to_string(),
			other => other.to_string(),
		}
	}
}

impl From<CallbackError> for ServerError {
	fn from(error: CallbackError) -> Self {
		match error {
			CallbackError::Rejected => ServerError::BadRequest(REJECTED_MESSAGE.to_string()),
			other => ServerError::Upstream(other.to_string()),
		}
	}
}

impl From<InviteError> for ServerError {
	fn from(error: InviteError) -> Self {
		match error {
			InviteError::UnknownScope(_) => ServerError::BadRequest(error.to_string()),
			other => ServerError::Upstream(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use vouch_invite::DeliveryError;

	#[rstest]
	#[case(CallbackError::Rejected, StatusCode::BAD_REQUEST)]
	#[case(CallbackError::Upstream("timeout".to_string()), StatusCode::BAD_GATEWAY)]
	#[case(CallbackError::Delivery(DeliveryError::Closed), StatusCode::BAD_GATEWAY)]
	fn test_callback_error_status(#[case] error: CallbackError, #[case] expected: StatusCode) {
		// Act
		let error = ServerError::from(error);

		// Assert
		assert_eq!(error.status(), expected);
	}

	#[rstest]
	fn test_rejected_message() {
		// Arrange
		let error = ServerError::from(CallbackError::Rejected);

		// Act & Assert
		assert_eq!(error.public_message(), REJECTED_MESSAGE);
	}

	#[rstest]
	fn test_upstream_details_hidden() {
		// Arrange
		let error = ServerError::from(InviteError::Storage("redis: connection refused".to_string()));

		// Act
		let message = error.public_message();

		// Assert
		assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
		assert!(!message.contains("redis"));
	}

	#[rstest]
	fn test_unknown_scope_is_bad_request() {
		// Arrange
		let error = ServerError::from(InviteError::UnknownScope("admin".to_string()));

		// Act & Assert
		assert_eq!(error.status(), StatusCode::BAD_REQUEST);
		assert_eq!(error.public_message(), "Unknown scope: admin");
	}
}
