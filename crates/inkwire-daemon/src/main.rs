//! inkwire: keep a chat gateway connection alive and show incoming messages.
//!
//! Run with a config file:
//!   inkwire --config inkwire.toml
//!
//! or entirely from the command line:
//!   INKWIRE_TOKEN=xoxb-... inkwire --fingerprint AB:CD:...

mod config;
mod render;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Config};
use inkwire_client::{ConnectionManager, DiscoveryResolver, WsConnector};
use render::TerminalRenderer;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "inkwire=info";

/// `RUST_LOG` when it is set and parses, otherwise info for this crate.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli).context("invalid configuration")?;

    tracing::info!("Using discovery endpoint {}", config.discovery_url);

    let resolver = DiscoveryResolver::new(
        config.discovery_url.clone(),
        config.fingerprint.clone(),
        config.request_timeout,
    )
    .context("failed to build discovery client")?;

    let connector = match config.stream_fingerprint.clone() {
        Some(fp) => WsConnector::pinned(fp).context("failed to build stream tls")?,
        None => WsConnector::native_roots(),
    };

    let renderer = TerminalRenderer::new(std::io::stdout());
    let mut manager = ConnectionManager::new(
        config.credential,
        resolver,
        connector,
        renderer,
        config.manager,
    );

    manager.run(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received ctrl-c"),
        Err(e) => {
            // Keep running; the process can still be killed.
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins_over_default() {
        let filter = log_filter(Some("inkwire=debug")).to_string();
        assert!(filter.contains("inkwire=debug"));
        assert!(!filter.contains("inkwire=info"));
    }

    #[test]
    fn default_filter_without_rust_log() {
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
    }
}
