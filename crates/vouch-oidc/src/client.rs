//! OIDC client driving PAR, JARM, token and userinfo requests

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::Validation;
use reqwest::Response;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use vouch_conf::OidcSettings;

use crate::config::{ClientConfig, ProviderCapabilities};
use crate::error::OidcError;
use crate::http::HttpClient;
use crate::jarm;
use crate::par::{AuthorizationParams, ErrorResponse, PushedAuthorizationResponse, authorization_url};
use crate::provider::{GrantChecks, IdentityProvider};
use crate::resolver::ProviderResolver;
use crate::token::{TokenResponse, TokenSet, validate_id_token};
use crate::userinfo::{JWT_CONTENT_TYPE, UserInfo};

/// OIDC client for a single provider
#[derive(Debug)]
pub struct OidcClient {
	resolver: ProviderResolver,
}

impl OidcClient {
	/// Creates a client around a resolver
	pub fn new(resolver: ProviderResolver) -> Self {
		Self { resolver }
	}

	/// Creates a client with a default HTTP client
	pub fn from_settings(settings: OidcSettings) -> Self {
		Self::new(ProviderResolver::new(settings, HttpClient::new()))
	}

	/// Underlying resolver
	pub fn resolver(&self) -> &ProviderResolver {
		&self.resolver
	}

	async fn config(&self) -> Result<Arc<ClientConfig>, OidcError> {
		self.resolver.ensure_loaded().await
	}

	async fn exchange_code(
		&self,
		config: &ClientConfig,
		code: &str,
		code_verifier: &str,
	) -> Result<TokenResponse, OidcError> {
		let mut form = vec![
			("grant_type", "authorization_code".to_string()),
			("code", code.to_string()),
			("redirect_uri", config.redirect_uri.clone()),
			("code_verifier", code_verifier.to_string()),
		];
		form.extend(config.client_auth.form_params(config.issuer())?);

		let response = self
			.resolver
			.http()
			.client()
			.post(&config.metadata.token_endpoint)
			.form(&form)
			.send()
			.await?;

		if !response.status().is_success() {
			let message = error_message(response).await;
			return Err(OidcError::TokenExchange(message));
		}

		response
			.json()
			.await
			.map_err(|e| OidcError::TokenExchange(e.to_string()))
	}
}

#[async_trait]
impl IdentityProvider for OidcClient {
	async fn ensure_loaded(&self) -> Result<ProviderCapabilities, OidcError> {
		Ok(self.config().await?.capabilities())
	}

	async fn push_authorization_request(
		&self,
		params: &AuthorizationParams,
	) -> Result<String, OidcError> {
		let config = self.config().await?;
		let endpoint = config.metadata.par_endpoint()?;

		let mut form = params.to_form(&config.redirect_uri);
		form.extend(config.client_auth.form_params(config.issuer())?);

		let response = self
			.resolver
			.http()
			.client()
			.post(endpoint)
			.form(&form)
			.send()
			.await?;

		if !response.status().is_success() {
			let message = error_message(response).await;
			return Err(OidcError::Par(message));
		}

		let pushed: PushedAuthorizationResponse = response
			.json()
			.await
			.map_err(|e| OidcError::Par(e.to_string()))?;
		tracing::debug!(expires_in = pushed.expires_in, "Authorization request pushed");

		authorization_url(
			&config.metadata.authorization_endpoint,
			&config.client_id,
			&pushed.request_uri,
		)
	}

	async fn verify_authorization_response(
		&self,
		response: &str,
		expected_state: &str,
	) -> Result<String, OidcError> {
		let config = self.config().await?;

		jarm::verify(
			response,
			&config.jwks,
			config.issuer(),
			&config.client_id,
			expected_state,
		)
		.await
	}

	async fn redeem_code(&self, code: &str, checks: &GrantChecks) -> Result<TokenSet, OidcError> {
		let config = self.config().await?;

		let tokens = self
			.exchange_code(&config, code, &checks.pkce_code_verifier)
			.await?;

		let id_token = tokens.id_token.as_deref().ok_or_else(|| {
			OidcError::InvalidResponse("Token response has no id_token".to_string())
		})?;
		let claims = validate_id_token(
			id_token,
			&config.jwks,
			config.issuer(),
			&config.client_id,
			&checks.expected_nonce,
		)
		.await?;

		Ok(TokenSet {
			access_token: tokens.access_token,
			token_type: tokens.token_type,
			expires_in: tokens.expires_in,
			refresh_token: tokens.refresh_token,
			scope: tokens.scope,
			claims,
		})
	}

	async fn fetch_user_info(
		&self,
		access_token: &str,
		expected_subject: &str,
	) -> Result<UserInfo, OidcError> {
		let config = self.config().await?;
		let endpoint = config.metadata.userinfo_endpoint.as_deref().ok_or_else(|| {
			OidcError::UserInfo("Provider has no userinfo endpoint".to_string())
		})?;

		let response = self
			.resolver
			.http()
			.client()
			.get(endpoint)
			.bearer_auth(access_token)
			.header(ACCEPT, format!("application/json, {}", JWT_CONTENT_TYPE))
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let message = error_message(response).await;
			return Err(OidcError::UserInfo(format!("{} ({})", message, status)));
		}

		let is_jwt = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.is_some_and(|v| v.starts_with(JWT_CONTENT_TYPE));

		let info: UserInfo = if is_jwt {
			let body = response.text().await?;
			let mut validation = Validation::default();
			validation.set_issuer(&[config.issuer()]);
			validation.set_audience(&[&config.client_id]);
			validation.validate_exp = false;
			validation.set_required_spec_claims::<&str>(&[]);
			config.jwks.verify(&body, &validation).await?
		} else {
			response
				.json()
				.await
				.map_err(|e| OidcError::UserInfo(e.to_string()))?
		};

		if info.sub != expected_subject {
			return Err(OidcError::SubjectMismatch);
		}

		Ok(info)
	}
}

async fn error_message(response: Response) -> String {
	let status = response.status();
	let body = response
		.text()
		.await
		.unwrap_or_else(|_| "Unknown error".to_string());
	match serde_json::from_str::<ErrorResponse>(&body) {
		Ok(error) => error.to_string(),
		Err(_) if body.is_empty() => status.to_string(),
		Err(_) => format!("{}: {}", status, body),
	}
}
