//! End-to-end verification flows against the mock provider

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rstest::rstest;
use serde_json::json;
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;
use vouch_cache::InMemoryCache;
use vouch_conf::OidcSettings;
use vouch_invite::{
	CallbackError, ChannelDelivery, ConversationContext, DeliveredOutcome, InviteError,
	OutcomeKind, PersonProof, SocialAccountProof, VerificationScope, VerificationService,
};
use vouch_oidc::{OidcClient, OidcError};
use vouch_test::{DEFAULT_SUBJECT, EcKeyPair, Endpoint, ErrorMode, MockProvider, Tampering};

struct Deployment {
	provider: MockProvider,
	cache: Arc<InMemoryCache>,
	service: Arc<VerificationService>,
	outcomes: Receiver<DeliveredOutcome>,
}

async fn deploy() -> Deployment {
	let provider = MockProvider::start().await;
	let settings = OidcSettings::from_source(&provider.settings()).unwrap();
	let cache = Arc::new(InMemoryCache::new());
	let (delivery, outcomes) = ChannelDelivery::new(16);
	let service = VerificationService::new(
		Arc::new(OidcClient::from_settings(settings)),
		cache.clone(),
		Arc::new(delivery),
	);
	Deployment {
		provider,
		cache,
		service: Arc::new(service),
		outcomes,
	}
}

fn context() -> ConversationContext {
	ConversationContext::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
}

#[rstest]
#[tokio::test]
async fn test_over18_flow_end_to_end() {
	// Arrange
	let mut d = deploy().await;
	d.provider.set_userinfo_claims(json!({
		"proof": {"credentialSubject": {"type": "Person", "over18": "true"}}
	}));
	let context = context();

	// Act
	let invite = d
		.service
		.issue_invite(VerificationScope::Over18, context)
		.await
		.unwrap();
	let response = d.provider.approve(&invite.url);
	let outcome = d.service.resolve_callback(&response).await.unwrap();

	// Assert
	assert_eq!(outcome.sub, DEFAULT_SUBJECT);
	assert_eq!(outcome.reference, invite.reference);
	assert_eq!(
		outcome.kind,
		OutcomeKind::Person(PersonProof {
			over18: Some("true".to_string()),
			..Default::default()
		})
	);

	let delivered = d.outcomes.recv().await.unwrap();
	assert_eq!(delivered.context, context);
	assert_eq!(delivered.summary, "You have passed over-18 verification");
	assert!(d.cache.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_pushed_request_is_bound_to_invite() {
	// Arrange
	let d = deploy().await;

	// Act
	let invite = d
		.service
		.issue_invite(VerificationScope::SocialTwitter, context())
		.await
		.unwrap();

	// Assert
	let pushed = d.provider.pushed_params(&invite.url);
	assert_eq!(pushed["state"], invite.reference);
	assert_eq!(pushed["scope"], "openid social:twitter");
	assert_eq!(pushed["code_challenge_method"], "S256");
	assert!(!pushed["nonce"].is_empty());
	assert!(invite.url.starts_with(&d.provider.issuer()));
}

#[rstest]
#[tokio::test]
async fn test_concurrent_issuance_discovers_once() {
	// Arrange
	let d = deploy().await;
	d.provider.set_discovery_delay(Duration::from_millis(200));

	// Act
	let handles: Vec<_> = (0..10)
		.map(|_| {
			let service = d.service.clone();
			tokio::spawn(async move {
				service
					.issue_invite(VerificationScope::Profile, context())
					.await
			})
		})
		.collect();
	let mut references = Vec::new();
	for handle in handles {
		references.push(handle.await.unwrap().unwrap().reference);
	}

	// Assert
	assert_eq!(d.provider.discovery_count(), 1);
	references.sort();
	references.dedup();
	assert_eq!(references.len(), 10);
}

#[rstest]
#[tokio::test]
async fn test_pkce_unsupported_provider_still_resolves() {
	// Arrange
	let mut d = deploy().await;
	d.provider.set_pkce_supported(false);

	// Act
	let invite = d
		.service
		.issue_invite(VerificationScope::Authenticate, context())
		.await
		.unwrap();
	let outcome = d
		.service
		.resolve_callback(&d.provider.approve(&invite.url))
		.await
		.unwrap();

	// Assert
	let pushed = d.provider.pushed_params(&invite.url);
	assert_eq!(pushed["state"], invite.reference);
	assert!(pushed.contains_key("code_challenge"));
	assert_eq!(outcome.kind, OutcomeKind::Auth);
	assert_eq!(
		d.outcomes.recv().await.unwrap().summary,
		format!("You have successfully authenticated as {}", DEFAULT_SUBJECT)
	);
}

#[rstest]
#[tokio::test]
async fn test_signed_userinfo_twitter_outcome() {
	// Arrange
	let mut d = deploy().await;
	d.provider.set_userinfo_as_jwt(true);
	d.provider.set_userinfo_claims(json!({
		"proof": {"credentialSubject": {
			"type": "Twitter",
			"username": "nuggets",
			"url": "https://x.com/nuggets",
		}}
	}));
	let invite = d
		.service
		.issue_invite(VerificationScope::SocialTwitter, context())
		.await
		.unwrap();

	// Act
	let outcome = d
		.service
		.resolve_callback(&d.provider.approve(&invite.url))
		.await
		.unwrap();

	// Assert
	assert_eq!(
		outcome.kind,
		OutcomeKind::Twitter(SocialAccountProof {
			url: Some("https://x.com/nuggets".to_string()),
			username: Some("nuggets".to_string()),
			profile_image: None,
		})
	);
	assert_eq!(
		d.outcomes.recv().await.unwrap().summary,
		"You have verified control of the following Twitter (X) account: @nuggets"
	);
}

#[rstest]
#[case::nonce(Tampering { nonce: Some("replayed".to_string()), ..Default::default() })]
#[case::state(Tampering { state: Some("injected".to_string()), ..Default::default() })]
#[case::subject(Tampering { userinfo_subject: Some("did:example:mallory".to_string()), ..Default::default() })]
#[case::audience(Tampering { jarm_audience: Some("another-client".to_string()), ..Default::default() })]
#[tokio::test]
async fn test_tampered_callback_rejected(#[case] tampering: Tampering) {
	// Arrange
	let mut d = deploy().await;
	d.provider.set_tampering(tampering);
	let invite = d
		.service
		.issue_invite(VerificationScope::Over18, context())
		.await
		.unwrap();

	// Act
	let result = d
		.service
		.resolve_callback(&d.provider.approve(&invite.url))
		.await;

	// Assert
	assert_eq!(result, Err(CallbackError::Rejected));
	assert!(d.outcomes.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_replayed_callback_rejected() {
	// Arrange
	let mut d = deploy().await;
	let invite = d
		.service
		.issue_invite(VerificationScope::Profile, context())
		.await
		.unwrap();
	let response = d.provider.approve(&invite.url);
	d.service.resolve_callback(&response).await.unwrap();

	// Act
	let replay = d.service.resolve_callback(&response).await;

	// Assert
	assert_eq!(replay, Err(CallbackError::Rejected));
	assert!(d.outcomes.recv().await.is_some());
	assert!(d.outcomes.try_recv().is_err());
	assert_eq!(d.provider.token_requests().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_callbacks_are_answered_alike() {
	// Arrange
	let mut d = deploy().await;
	let invite = d
		.service
		.issue_invite(VerificationScope::Authenticate, context())
		.await
		.unwrap();
	let response = d.provider.approve(&invite.url);

	// Act
	let handles: Vec<_> = (0..8)
		.map(|_| {
			let service = d.service.clone();
			let response = response.clone();
			tokio::spawn(async move { service.resolve_callback(&response).await })
		})
		.collect();
	let mut results = Vec::new();
	for handle in handles {
		results.push(handle.await.unwrap());
	}

	// Assert
	assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
	assert!(
		results
			.iter()
			.filter_map(|r| r.as_ref().err())
			.all(|e| *e == CallbackError::Rejected)
	);
	assert_eq!(d.provider.token_requests().len(), 1);
	assert!(d.outcomes.recv().await.is_some());
	assert!(d.outcomes.try_recv().is_err());
}

fn unsigned_response(state: &str) -> String {
	format!(
		"{}.{}.c2ln",
		URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256"}"#),
		URL_SAFE_NO_PAD.encode(json!({"state": state, "code": "x"}).to_string())
	)
}

#[rstest]
#[case::unsigned(false)]
#[case::foreign_key(true)]
#[tokio::test]
async fn test_forged_callback_does_not_cancel_invite(#[case] signed_by_impostor: bool) {
	// Arrange
	let mut d = deploy().await;
	let invite = d
		.service
		.issue_invite(VerificationScope::Over18, context())
		.await
		.unwrap();
	let forged = if signed_by_impostor {
		d.provider
			.approve_signed_by(&invite.url, &EcKeyPair::generate("mock-provider-key"))
	} else {
		unsigned_response(&invite.reference)
	};

	// Act
	let forged_result = d.service.resolve_callback(&forged).await;
	let genuine_result = d
		.service
		.resolve_callback(&d.provider.approve(&invite.url))
		.await;

	// Assert
	assert_eq!(forged_result, Err(CallbackError::Rejected));
	assert_eq!(genuine_result.unwrap().reference, invite.reference);
	assert!(d.outcomes.recv().await.is_some());
	assert_eq!(d.provider.token_requests().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_denied_consent_rejected() {
	// Arrange
	let mut d = deploy().await;
	let invite = d
		.service
		.issue_invite(VerificationScope::Over18, context())
		.await
		.unwrap();

	// Act
	let result = d
		.service
		.resolve_callback(&d.provider.deny(&invite.url, "access_denied"))
		.await;

	// Assert
	assert_eq!(result, Err(CallbackError::Rejected));
	assert!(d.cache.is_empty());
	assert!(d.outcomes.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_par_failure_stores_nothing() {
	// Arrange
	let d = deploy().await;
	d.provider.set_error_mode(Endpoint::Par, ErrorMode::ServerError);

	// Act
	let result = d
		.service
		.issue_invite(VerificationScope::Over18, context())
		.await;

	// Assert
	assert!(matches!(
		result,
		Err(InviteError::Provider(OidcError::Par(_)))
	));
	assert!(d.cache.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_token_endpoint_failure_is_upstream() {
	// Arrange
	let mut d = deploy().await;
	let invite = d
		.service
		.issue_invite(VerificationScope::Over18, context())
		.await
		.unwrap();
	d.provider
		.set_error_mode(Endpoint::Token, ErrorMode::ServerError);

	// Act
	let result = d
		.service
		.resolve_callback(&d.provider.approve(&invite.url))
		.await;

	// Assert
	assert!(matches!(result, Err(CallbackError::Upstream(_))));
	assert!(!d.cache.is_empty());
	assert!(d.outcomes.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_invalid_configuration_fails_fast() {
	// Arrange
	let provider = MockProvider::start().await;
	let source = provider.settings();
	source.remove(vouch_conf::names::CLIENT_ID);

	// Act
	let result = VerificationService::from_source(
		&source,
		Arc::new(vouch_invite::TracingDelivery),
	);

	// Assert
	assert!(matches!(
		result,
		Err(InviteError::Provider(OidcError::Configuration(ref m))) if m.contains("NUGGETS_OIDC_CLIENT_ID")
	));
}
