//! Invite issuance

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vouch_cache::{CacheBackend, CacheExt};
use vouch_oidc::{AuthorizationParams, CodeVerifier, IdentityProvider, random_token};

use crate::context::ConversationContext;
use crate::error::InviteError;
use crate::flow::{FLOW_TTL, PendingFlow};
use crate::scope::VerificationScope;

/// Link handed to the user, plus the reference correlating its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
	/// Provider-hosted URL the user must open
	pub url: String,
	/// Correlation reference (the transmitted state)
	#[serde(rename = "ref")]
	pub reference: String,
}

/// Starts flows: pushes the authorization request and parks its secrets
pub struct InviteIssuer {
	provider: Arc<dyn IdentityProvider>,
	cache: Arc<dyn CacheBackend>,
}

impl InviteIssuer {
	/// Creates an issuer
	pub fn new(provider: Arc<dyn IdentityProvider>, cache: Arc<dyn CacheBackend>) -> Self {
		Self { provider, cache }
	}

	/// Issues a single-use invite for `scope` in `context`
	///
	/// The pending flow is stored only once the provider accepted the pushed
	/// request, so a failed issuance leaves nothing behind.
	pub async fn issue_invite(
		&self,
		scope: VerificationScope,
		context: ConversationContext,
	) -> Result<Invite, InviteError> {
		let capabilities = self.provider.ensure_loaded().await?;

		let requested_scope = scope.requested_scope();
		// The challenge is sent even when the provider does not advertise PKCE
		let verifier = CodeVerifier::generate();
		let nonce = random_token();
		let mut state = random_token();
		if !capabilities.pkce_supported {
			// Fresh state; the transmitted value is the cache key below
			state = random_token();
		}

		let params = AuthorizationParams {
			scope: requested_scope.clone(),
			state: state.clone(),
			nonce: nonce.clone(),
			code_challenge: verifier.challenge(),
		};
		let url = self.provider.push_authorization_request(&params).await?;

		let pending = PendingFlow {
			nonce,
			code_verifier: verifier.secret().to_string(),
			scope: requested_scope,
			context,
		};
		self.cache.set(&params.state, &pending, FLOW_TTL).await?;

		tracing::debug!(state = %params.state, scope = %scope, "Verification invite issued");

		Ok(Invite {
			url,
			reference: params.state,
		})
	}
}
