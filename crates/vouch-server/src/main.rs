//! Verification server binary
//!
//! ```bash
//! NUGGETS_OIDC_CLIENT_ID=agent-client \
//! NUGGETS_OIDC_PRIVATE_KEY="$(cat client-jwks.json)" \
//! SERVER_PORT=3000 \
//! vouch-server
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use vouch_conf::{EnvSettings, OidcSettings};
use vouch_invite::{TracingDelivery, VerificationService};
use vouch_server::{HttpServer, VerificationHandler};

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "vouch-server")]
#[command(about = "Issues verification invites and resolves provider callbacks", long_about = None)]
#[command(version)]
struct Cli {
	/// Address to bind
	#[arg(long, default_value = "0.0.0.0")]
	bind: IpAddr,

	/// Port to listen on (defaults to SERVER_PORT, then 3000)
	#[arg(short, long)]
	port: Option<u16>,

	/// Prefix prepended to every setting name read from the environment
	#[arg(long, env = "VOUCH_SETTINGS_PREFIX")]
	settings_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let cli = Cli::parse();
	let source = match &cli.settings_prefix {
		Some(prefix) => EnvSettings::with_prefix(prefix.clone()),
		None => EnvSettings::new(),
	};
	let settings = OidcSettings::from_source(&source).context("Invalid OIDC settings")?;
	let port = cli.port.or(settings.server_port).unwrap_or(DEFAULT_PORT);
	tracing::info!(redirect_uri = %settings.redirect_uri(), "Loaded OIDC settings");

	let service = Arc::new(VerificationService::from_settings(
		settings,
		Arc::new(TracingDelivery),
	));
	let capabilities = service
		.ensure_loaded()
		.await
		.context("Identity provider configuration failed")?;
	tracing::info!(
		issuer = %capabilities.issuer,
		pkce = capabilities.pkce_supported,
		"Identity provider ready"
	);

	let addr = SocketAddr::new(cli.bind, port);
	let listener = TcpListener::bind(addr)
		.await
		.with_context(|| format!("Failed to bind {}", addr))?;

	HttpServer::new(VerificationHandler::new(service))
		.serve(listener, async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::warn!(error = %e, "Failed to listen for shutdown signal");
				std::future::pending::<()>().await;
			}
		})
		.await?;

	Ok(())
}
