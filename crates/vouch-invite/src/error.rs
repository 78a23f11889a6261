//! Invite and callback error types

use thiserror::Error;
use vouch_cache::CacheError;
use vouch_oidc::OidcError;

/// Invite issuance errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InviteError {
	/// Requested scope is not one of the supported scopes
	#[error("Unknown scope: {0}")]
	UnknownScope(String),

	/// Provider configuration, PAR or discovery failed
	#[error("Provider error: {0}")]
	Provider(#[from] OidcError),

	/// Pending flow could not be stored
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<CacheError> for InviteError {
	fn from(error: CacheError) -> Self {
		InviteError::Storage(error.to_string())
	}
}

/// Outcome delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
	/// The receiving side is gone
	#[error("Delivery channel closed")]
	Closed,

	/// Collaborator-specific failure
	#[error("Delivery failed: {0}")]
	Failed(String),
}

/// Callback resolution errors
///
/// Unknown, expired, already-consumed and tampered callbacks all surface as
/// [`CallbackError::Rejected`] so the caller learns nothing about which check
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
	/// Unknown or expired flow
	#[error("Unknown or expired flow")]
	Rejected,

	/// Provider or storage failed while completing the flow
	#[error("Upstream error: {0}")]
	Upstream(String),

	/// Outcome was produced but could not be delivered
	#[error("Delivery error: {0}")]
	Delivery(#[from] DeliveryError),
}

impl From<CacheError> for CallbackError {
	fn from(error: CacheError) -> Self {
		CallbackError::Upstream(error.to_string())
	}
}
