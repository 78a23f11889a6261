//! One-time provider configuration

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::OnceCell;
use vouch_conf::OidcSettings;

use crate::client_auth::PrivateKeyJwt;
use crate::config::ClientConfig;
use crate::discovery::DiscoveryClient;
use crate::error::OidcError;
use crate::http::HttpClient;
use crate::jwks::JwksCache;

/// Loads the [`ClientConfig`] at most once per process
///
/// Concurrent first callers share a single in-flight load. A failed load is
/// not cached, so the next caller tries again.
#[derive(Debug)]
pub struct ProviderResolver {
	settings: OidcSettings,
	client: HttpClient,
	config: OnceCell<Arc<ClientConfig>>,
	loads: AtomicU64,
}

impl ProviderResolver {
	/// Creates a resolver; nothing is fetched until [`ensure_loaded`](Self::ensure_loaded)
	pub fn new(settings: OidcSettings, client: HttpClient) -> Self {
		Self {
			settings,
			client,
			config: OnceCell::new(),
			loads: AtomicU64::new(0),
		}
	}

	/// Settings this resolver was created with
	pub fn settings(&self) -> &OidcSettings {
		&self.settings
	}

	/// HTTP client shared with flow requests
	pub fn http(&self) -> &HttpClient {
		&self.client
	}

	/// Returns the configuration, loading it on first use
	///
	/// # Errors
	///
	/// Configuration-class errors: unusable signing keys, failed discovery, or
	/// a provider without a PAR endpoint.
	pub async fn ensure_loaded(&self) -> Result<Arc<ClientConfig>, OidcError> {
		let config = self.config.get_or_try_init(|| self.load()).await?;
		Ok(Arc::clone(config))
	}

	/// Whether a configuration has been loaded
	pub fn is_loaded(&self) -> bool {
		self.config.initialized()
	}

	/// Number of load attempts made so far
	pub fn load_attempts(&self) -> u64 {
		self.loads.load(Ordering::Relaxed)
	}

	async fn load(&self) -> Result<Arc<ClientConfig>, OidcError> {
		self.loads.fetch_add(1, Ordering::Relaxed);
		let settings = &self.settings;

		let client_auth = PrivateKeyJwt::from_jwk_set(&settings.client_id, &settings.private_key_set)
			.map_err(|e| OidcError::Configuration(e.to_string()))?;

		let metadata = DiscoveryClient::new(self.client.clone())
			.discover(&settings.provider_url)
			.await?;
		metadata.par_endpoint()?;

		let jwks = JwksCache::new(self.client.clone(), metadata.jwks_uri.clone());

		tracing::info!(
			issuer = %metadata.issuer,
			pkce = metadata.supports_pkce(),
			"OIDC provider configuration loaded"
		);

		Ok(Arc::new(ClientConfig {
			metadata,
			client_id: settings.client_id.clone(),
			redirect_uri: settings.redirect_uri(),
			client_auth,
			jwks,
		}))
	}
}
