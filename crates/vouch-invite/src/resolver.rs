//! Callback resolution

use std::sync::Arc;

use vouch_cache::{CacheBackend, CacheExt, Claimed};
use vouch_oidc::{GrantChecks, IdentityProvider, OidcError, decode_state_unverified};

use crate::delivery::OutcomeDelivery;
use crate::error::CallbackError;
use crate::flow::PendingFlow;
use crate::outcome::CallbackOutcome;

/// Completes flows when the provider calls back
pub struct CallbackResolver {
	provider: Arc<dyn IdentityProvider>,
	cache: Arc<dyn CacheBackend>,
	delivery: Arc<dyn OutcomeDelivery>,
}

impl CallbackResolver {
	/// Creates a resolver
	pub fn new(
		provider: Arc<dyn IdentityProvider>,
		cache: Arc<dyn CacheBackend>,
		delivery: Arc<dyn OutcomeDelivery>,
	) -> Self {
		Self {
			provider,
			cache,
			delivery,
		}
	}

	/// Resolves a signed callback payload into a delivered outcome
	///
	/// The pending flow is consumed at most once. A payload whose state is
	/// unknown, expired, already consumed, or not bound to the stored nonce
	/// and verifier yields [`CallbackError::Rejected`] and nothing is delivered.
	///
	/// A payload that fails signature verification never touches the pending
	/// flow. The flow is claimed atomically before its code is redeemed, so
	/// racing callbacks for one state reach the provider only once.
	///
	/// # Errors
	///
	/// - [`CallbackError::Rejected`] for unknown or tampered callbacks
	/// - [`CallbackError::Upstream`] when the provider or the cache fails
	/// - [`CallbackError::Delivery`] when the conversational side refuses the outcome
	pub async fn resolve_callback(&self, response: &str) -> Result<CallbackOutcome, CallbackError> {
		let state = decode_state_unverified(response).map_err(|e| {
			tracing::debug!(error = %e, "Callback payload is not a readable response");
			CallbackError::Rejected
		})?;

		if self.cache.get_raw(&state).await?.is_none() {
			tracing::debug!(state = %state, "No pending flow for callback state");
			return Err(CallbackError::Rejected);
		}

		let code = match self.provider.verify_authorization_response(response, &state).await {
			Ok(code) => code,
			Err(error) if is_unverified(&error) => {
				tracing::warn!(state = %state, "Callback signature did not verify");
				tracing::debug!(error = %error, "Rejection cause");
				return Err(CallbackError::Rejected);
			}
			Err(error) if rejects_flow(&error) => {
				if let Err(e) = self.cache.delete(&state).await {
					tracing::warn!(error = %e, "Failed to invalidate rejected flow");
				}
				return Err(rejected(&state, &error));
			}
			Err(error) => return Err(upstream(error)),
		};

		// Whoever takes the entry owns the outcome
		let Some(claimed) = self.cache.take::<PendingFlow>(&state).await? else {
			tracing::debug!(state = %state, "Pending flow consumed concurrently");
			return Err(CallbackError::Rejected);
		};
		let pending = &claimed.value;

		let checks = GrantChecks {
			pkce_code_verifier: pending.code_verifier.clone(),
			expected_state: state.clone(),
			expected_nonce: pending.nonce.clone(),
		};
		let tokens = match self.provider.redeem_code(&code, &checks).await {
			Ok(tokens) => tokens,
			Err(error) => return Err(self.release(&state, claimed, error).await),
		};
		let info = match self
			.provider
			.fetch_user_info(&tokens.access_token, tokens.subject())
			.await
		{
			Ok(info) => info,
			Err(error) => return Err(self.release(&state, claimed, error).await),
		};

		let outcome = CallbackOutcome::from_user_info(state, pending.is_auth_only(), &info);

		self.delivery
			.deliver_outcome(&outcome, &pending.context)
			.await?;
		tracing::info!(kind = outcome.kind.name(), "Verification callback resolved");

		Ok(outcome)
	}

	/// Settles a claimed flow after a failed exchange
	///
	/// Upstream failures put the entry back with the lifetime it had left.
	async fn release(
		&self,
		state: &str,
		claimed: Claimed<PendingFlow>,
		error: OidcError,
	) -> CallbackError {
		if rejects_flow(&error) || matches!(error, OidcError::TokenValidation(_)) {
			return rejected(state, &error);
		}

		if !claimed.remaining.is_zero() {
			let restored = self
				.cache
				.set(state, &claimed.value, claimed.remaining)
				.await;
			if let Err(e) = restored {
				tracing::warn!(error = %e, "Failed to restore pending flow");
			}
		}
		upstream(error)
	}
}

fn rejected(state: &str, error: &OidcError) -> CallbackError {
	tracing::warn!(state = %state, "Verification callback rejected");
	tracing::debug!(error = %error, "Rejection cause");
	CallbackError::Rejected
}

fn upstream(error: OidcError) -> CallbackError {
	tracing::warn!(error = %error, "Provider failed while completing verification flow");
	CallbackError::Upstream(error.to_string())
}

/// Failures of a response that cannot be attributed to the provider
fn is_unverified(error: &OidcError) -> bool {
	matches!(
		error,
		OidcError::TokenValidation(_) | OidcError::InvalidResponse(_)
	)
}

/// Failures reported in a verified response, which end the flow
fn rejects_flow(error: &OidcError) -> bool {
	error.is_security_mismatch() || matches!(error, OidcError::Authorization { .. })
}
