//! Provider clients and their normalization adapters
//!
//! Each provider module owns an HTTP client for one protocol plus a pure
//! `adapt` function that maps the provider's raw profile JSON onto
//! [`ProfileStats`]. Anything the adapter does not read survives only in
//! the `raw` passthrough.

mod discord;
mod farcaster;
mod lens;
mod twitter;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::ProviderError;
use crate::types::{ProfileStats, Protocol};

pub use discord::DiscordClient;
pub use farcaster::FarcasterClient;
pub use lens::LensClient;
pub use twitter::TwitterClient;

/// A source of profiles for one protocol
#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Fetch the provider's raw profile for `handle`. `Ok(None)` means the
    /// provider has no such profile.
    async fn lookup(&self, handle: &str) -> Result<Option<Value>, ProviderError>;

    /// Map a raw profile returned by [`ProfileSource::lookup`] onto the
    /// normalized stats
    fn normalize(&self, raw: &Value) -> ProfileStats;
}

/// Endpoints, secrets and timeouts for the built-in provider clients
#[derive(Clone)]
pub struct ProviderSettings {
    pub farcaster_url: String,
    pub lens_url: String,
    pub twitter_url: String,
    pub discord_url: String,
    pub twitter_bearer_token: Option<String>,
    pub discord_bot_token: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            farcaster_url: FarcasterClient::DEFAULT_BASE_URL.to_string(),
            lens_url: LensClient::DEFAULT_API_URL.to_string(),
            twitter_url: TwitterClient::DEFAULT_BASE_URL.to_string(),
            discord_url: DiscordClient::DEFAULT_BASE_URL.to_string(),
            twitter_bearer_token: None,
            discord_bot_token: None,
            request_timeout: Duration::from_secs(10),
            user_agent: "chainboard-identity/0.1".to_string(),
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("farcaster_url", &self.farcaster_url)
            .field("lens_url", &self.lens_url)
            .field("twitter_url", &self.twitter_url)
            .field("discord_url", &self.discord_url)
            .field("twitter_bearer_token", &self.twitter_bearer_token.is_some())
            .field("discord_bot_token", &self.discord_bot_token.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// One client per built-in protocol
pub fn default_sources(settings: &ProviderSettings) -> Vec<Arc<dyn ProfileSource>> {
    vec![
        Arc::new(FarcasterClient::new(settings)),
        Arc::new(LensClient::new(settings)),
        Arc::new(TwitterClient::new(settings)),
        Arc::new(DiscordClient::new(settings)),
    ]
}

pub(crate) fn http_client(settings: &ProviderSettings) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.as_str())
        .build()
        .expect("Failed to create HTTP client")
}

/// Read a provider response: 404 is "no profile", any other non-success
/// status is an error
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Option<Value>, ProviderError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    Ok(Some(response.json::<Value>().await?))
}

/// Read a count that providers send either as a JSON number or as a string
pub(crate) fn as_count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Strip a leading `@`, which users routinely paste along with handles
pub(crate) fn bare_handle(handle: &str) -> &str {
    handle.trim().trim_start_matches('@')
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_count() {
        assert_eq!(as_count(Some(&json!(150))), Some(150));
        assert_eq!(as_count(Some(&json!("42"))), Some(42));
        assert_eq!(as_count(Some(&json!(-1))), None);
        assert_eq!(as_count(Some(&json!("lots"))), None);
        assert_eq!(as_count(Some(&json!(null))), None);
        assert_eq!(as_count(None), None);
    }

    #[test]
    fn test_bare_handle() {
        assert_eq!(bare_handle("@alice"), "alice");
        assert_eq!(bare_handle(" alice "), "alice");
        assert_eq!(bare_handle("@"), "");
    }

    #[test]
    fn test_default_sources_cover_every_protocol() {
        let sources = default_sources(&ProviderSettings::default());
        let mut protocols: Vec<_> = sources.iter().map(|s| s.protocol()).collect();
        protocols.sort();
        assert_eq!(protocols, Protocol::ALL.to_vec());
    }

    #[test]
    fn test_settings_debug_hides_tokens() {
        let settings = ProviderSettings {
            twitter_bearer_token: Some("AAAA-secret".to_string()),
            ..ProviderSettings::default()
        };
        assert!(!format!("{:?}", settings).contains("AAAA-secret"));
    }
}
