//! Service configuration parsed from environment variables

use std::env;
use std::time::Duration;

use credential_vault::{SealedCredential, Vault, SECRET_ENV_VAR};
use social_identity::{AggregatorConfig, ProviderSettings};

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub provider_timeout_secs: u64,
    pub farcaster_url: Option<String>,
    pub lens_url: Option<String>,
    pub twitter_url: Option<String>,
    pub discord_url: Option<String>,
    /// Twitter app bearer token, sealed by the `seal-credential` tool
    pub twitter_bearer_token: Option<SealedCredential>,
    /// Optional Discord bot token, sealed by the `seal-credential` tool
    pub discord_bot_token: Option<SealedCredential>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3005,
            cache_ttl_secs: 60 * 60, // 1 hour
            provider_timeout_secs: 10,
            farcaster_url: None,
            lens_url: None,
            twitter_url: None,
            discord_url: None,
            twitter_bearer_token: None,
            discord_bot_token: None,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cache_ttl_secs = var("SOCIAL_CACHE_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|&s| s > 0)
            .unwrap_or(defaults.cache_ttl_secs);

        let provider_timeout_secs = var("PROVIDER_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|&s| s > 0)
            .unwrap_or(defaults.provider_timeout_secs);

        let twitter_bearer_token = sealed(&var, "TWITTER_BEARER_TOKEN_SEALED")?;
        let discord_bot_token = sealed(&var, "DISCORD_BOT_TOKEN_SEALED")?;

        Ok(Self {
            port,
            cache_ttl_secs,
            provider_timeout_secs,
            farcaster_url: var("WARPCAST_API_URL"),
            lens_url: var("LENS_API_URL"),
            twitter_url: var("TWITTER_API_URL"),
            discord_url: var("DISCORD_API_URL"),
            twitter_bearer_token,
            discord_bot_token,
        })
    }

    /// Whether any provider secret has to be unsealed at startup
    pub fn has_sealed_credentials(&self) -> bool {
        self.twitter_bearer_token.is_some() || self.discord_bot_token.is_some()
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            provider_timeout: Duration::from_secs(self.provider_timeout_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }

    /// Build the provider client settings, unsealing provider secrets with
    /// `vault`
    pub fn provider_settings(&self, vault: Option<&Vault>) -> Result<ProviderSettings> {
        let defaults = ProviderSettings::default();

        let unseal = |sealed: &Option<SealedCredential>| -> Result<Option<String>> {
            let Some(sealed) = sealed else {
                return Ok(None);
            };
            let vault = vault.ok_or_else(|| {
                ServiceError::Config(format!(
                    "{SECRET_ENV_VAR} is required to unseal provider credentials"
                ))
            })?;
            Ok(Some(vault.unseal(sealed)?))
        };

        Ok(ProviderSettings {
            farcaster_url: self.farcaster_url.clone().unwrap_or(defaults.farcaster_url),
            lens_url: self.lens_url.clone().unwrap_or(defaults.lens_url),
            twitter_url: self.twitter_url.clone().unwrap_or(defaults.twitter_url),
            discord_url: self.discord_url.clone().unwrap_or(defaults.discord_url),
            twitter_bearer_token: unseal(&self.twitter_bearer_token)?,
            discord_bot_token: unseal(&self.discord_bot_token)?,
            // Leave headroom so the aggregator's own timeout fires first
            request_timeout: Duration::from_secs(self.provider_timeout_secs + 1),
            user_agent: defaults.user_agent,
        })
    }
}

fn sealed(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<SealedCredential>> {
    match var(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ServiceError::Config(format!("{key} is not a sealed credential: {e}"))),
    }
}
