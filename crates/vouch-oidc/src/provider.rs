//! Identity provider abstraction

use async_trait::async_trait;

use crate::config::ProviderCapabilities;
use crate::error::OidcError;
use crate::par::AuthorizationParams;
use crate::token::TokenSet;
use crate::userinfo::UserInfo;

/// Expected values a callback must be bound to
#[derive(Clone, PartialEq, Eq)]
pub struct GrantChecks {
	/// PKCE verifier sent to the token endpoint
	pub pkce_code_verifier: String,
	/// State the flow was started with
	pub expected_state: String,
	/// Nonce the ID token must carry
	pub expected_nonce: String,
}

impl std::fmt::Debug for GrantChecks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GrantChecks")
			.field("expected_state", &self.expected_state)
			.finish_non_exhaustive()
	}
}

/// Outbound operations against an OIDC provider
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use vouch_oidc::{IdentityProvider, OidcClient};
///
/// let provider: Arc<dyn IdentityProvider> = Arc::new(OidcClient::from_settings(settings));
/// let capabilities = provider.ensure_loaded().await?;
/// let url = provider.push_authorization_request(&params).await?;
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Loads provider configuration once and reports its capabilities
	async fn ensure_loaded(&self) -> Result<ProviderCapabilities, OidcError>;

	/// Pushes an authorization request and returns the browser redirect URL
	async fn push_authorization_request(
		&self,
		params: &AuthorizationParams,
	) -> Result<String, OidcError>;

	/// Verifies a signed authorization response and returns its code
	///
	/// Nothing in `response` is trusted before this succeeds.
	///
	/// # Errors
	///
	/// * [`OidcError::TokenValidation`] - bad signature, issuer, audience or expiry
	/// * [`OidcError::StateMismatch`] - the signed `state` is not `expected_state`
	/// * [`OidcError::Authorization`] - the provider reported an error
	async fn verify_authorization_response(
		&self,
		response: &str,
		expected_state: &str,
	) -> Result<String, OidcError>;

	/// Redeems a verified code and validates the returned ID token
	async fn redeem_code(&self, code: &str, checks: &GrantChecks) -> Result<TokenSet, OidcError>;

	/// Verifies a signed authorization response and redeems its code
	///
	/// # Arguments
	///
	/// * `response` - Compact JWT from the callback's `response` parameter
	/// * `checks` - Values the response and ID token must be bound to
	async fn authorization_code_grant(
		&self,
		response: &str,
		checks: &GrantChecks,
	) -> Result<TokenSet, OidcError> {
		let code = self
			.verify_authorization_response(response, &checks.expected_state)
			.await?;
		self.redeem_code(&code, checks).await
	}

	/// Fetches userinfo and checks that it describes `expected_subject`
	async fn fetch_user_info(
		&self,
		access_token: &str,
		expected_subject: &str,
	) -> Result<UserInfo, OidcError>;
}
