//! Chainboard identity service
//!
//! Aggregates a project's Farcaster, Lens, Twitter and Discord profiles for
//! the dashboard. Provider secrets arrive sealed and are unsealed once at
//! startup with the credential vault.

mod config;
mod error;
mod server;
mod types;

use std::sync::Arc;

use credential_vault::{Vault, VaultConfig};
use social_identity::{AggregateCache, Aggregator};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("chainboard_identity=info".parse()?)
        .add_directive("social_identity=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Chainboard identity service...");

    let config = Config::from_env()?;
    info!("Port: {}", config.port);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);
    info!("Provider timeout: {} seconds", config.provider_timeout_secs);

    // The vault is only needed when there is something to unseal; a missing
    // secret in that case is fatal
    let vault = if config.has_sealed_credentials() {
        Some(Vault::new(&VaultConfig::from_env()?)?)
    } else {
        None
    };

    let settings = config.provider_settings(vault.as_ref())?;
    drop(vault);
    if settings.twitter_bearer_token.is_none() {
        warn!("No Twitter bearer token configured; twitter lookups will report errors");
    }

    let aggregator_config = config.aggregator_config();
    let cache_ttl = aggregator_config.cache_ttl;
    let aggregator = Aggregator::with_default_sources(aggregator_config, &settings);
    let cache = AggregateCache::new(Arc::new(aggregator), cache_ttl);

    let state: SharedState = Arc::new(ServerState::new(cache));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}
