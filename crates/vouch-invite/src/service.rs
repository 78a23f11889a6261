//! Verification service facade

use std::sync::Arc;

use vouch_cache::{CacheBackend, InMemoryCache};
use vouch_conf::{OidcSettings, SettingsSource};
use vouch_oidc::{IdentityProvider, OidcClient, OidcError, ProviderCapabilities};

use crate::context::ConversationContext;
use crate::delivery::OutcomeDelivery;
use crate::error::{CallbackError, InviteError};
use crate::intent::{Intent, IntentTable};
use crate::issuer::{Invite, InviteIssuer};
use crate::outcome::CallbackOutcome;
use crate::resolver::CallbackResolver;
use crate::scope::VerificationScope;

/// Issues invites and resolves their callbacks against one provider
///
/// The issuer and the resolver share the provider client and the flow cache.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use vouch_conf::EnvSettings;
/// use vouch_invite::{ConversationContext, TracingDelivery, VerificationScope, VerificationService};
///
/// let service = VerificationService::from_source(&EnvSettings::new(), Arc::new(TracingDelivery))?;
/// let invite = service
/// 	.issue_invite(VerificationScope::Over18, ConversationContext::new(agent, room, entity))
/// 	.await?;
/// println!("{} ({})", invite.url, invite.reference);
/// ```
pub struct VerificationService {
	provider: Arc<dyn IdentityProvider>,
	issuer: InviteIssuer,
	resolver: CallbackResolver,
	intents: IntentTable,
}

impl VerificationService {
	/// Creates a service from its collaborators
	pub fn new(
		provider: Arc<dyn IdentityProvider>,
		cache: Arc<dyn CacheBackend>,
		delivery: Arc<dyn OutcomeDelivery>,
	) -> Self {
		Self {
			issuer: InviteIssuer::new(provider.clone(), cache.clone()),
			resolver: CallbackResolver::new(provider.clone(), cache, delivery),
			provider,
			intents: IntentTable::default(),
		}
	}

	/// Creates a service with an [`OidcClient`] and a process-local cache
	pub fn from_settings(settings: OidcSettings, delivery: Arc<dyn OutcomeDelivery>) -> Self {
		Self::new(
			Arc::new(OidcClient::from_settings(settings)),
			Arc::new(InMemoryCache::new()),
			delivery,
		)
	}

	/// Validates settings from `source` and creates a service
	pub fn from_source(
		source: &dyn SettingsSource,
		delivery: Arc<dyn OutcomeDelivery>,
	) -> Result<Self, InviteError> {
		let settings = OidcSettings::from_source(source).map_err(OidcError::from)?;
		Ok(Self::from_settings(settings, delivery))
	}

	/// Replaces the intent table
	pub fn with_intents(mut self, intents: IntentTable) -> Self {
		self.intents = intents;
		self
	}

	/// Intent table used by [`issue_invite_for_text`](Self::issue_invite_for_text)
	pub fn intents(&self) -> &IntentTable {
		&self.intents
	}

	/// Loads the provider configuration without issuing anything
	pub async fn ensure_loaded(&self) -> Result<ProviderCapabilities, InviteError> {
		Ok(self.provider.ensure_loaded().await?)
	}

	/// Issues an invite for `scope`
	pub async fn issue_invite(
		&self,
		scope: VerificationScope,
		context: ConversationContext,
	) -> Result<Invite, InviteError> {
		self.issuer.issue_invite(scope, context).await
	}

	/// Issues an invite for the intent best matching `text`
	///
	/// Returns `Ok(None)` when no intent matches.
	pub async fn issue_invite_for_text(
		&self,
		text: &str,
		context: ConversationContext,
	) -> Result<Option<(&Intent, Invite)>, InviteError> {
		let Some(intent) = self.intents.match_text(text) else {
			return Ok(None);
		};
		let invite = self.issuer.issue_invite(intent.scope, context).await?;
		Ok(Some((intent, invite)))
	}

	/// Resolves a callback payload and delivers its outcome
	pub async fn resolve_callback(&self, response: &str) -> Result<CallbackOutcome, CallbackError> {
		self.resolver.resolve_callback(response).await
	}
}
