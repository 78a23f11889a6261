//! Shared HTTP client for provider requests

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("vouch/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around a pooled [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct HttpClient {
	client: Client,
}

impl HttpClient {
	/// Creates a client with the default request timeout
	pub fn new() -> Self {
		Self::with_timeout(DEFAULT_TIMEOUT)
	}

	/// Creates a client with a custom request timeout
	pub fn with_timeout(timeout: Duration) -> Self {
		let client = Client::builder()
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()
			.unwrap_or_else(|e| {
				tracing::warn!(error = %e, "Falling back to default HTTP client");
				Client::new()
			});
		Self { client }
	}

	/// Wraps an existing client
	pub fn from_client(client: Client) -> Self {
		Self { client }
	}

	/// Underlying reqwest client
	pub fn client(&self) -> &Client {
		&self.client
	}
}

impl Default for HttpClient {
	fn default() -> Self {
		Self::new()
	}
}
