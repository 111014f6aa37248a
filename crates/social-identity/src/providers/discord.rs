//! Discord servers via invite lookups
//!
//! Discord has no follower concept for accounts, so a project's Discord
//! handle is its server invite and the member count stands in for followers.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{as_count, http_client, read_json, ProfileSource, ProviderSettings};
use crate::error::ProviderError;
use crate::types::{ProfileStats, Protocol};

/// Guild features that mark an officially recognized server
const VERIFIED_FEATURES: [&str; 2] = ["VERIFIED", "PARTNERED"];

/// Looks up Discord invites with approximate member counts
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: Option<String>,
}

impl DiscordClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://discord.com/api/v10";

    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            http: http_client(settings),
            base_url: settings.discord_url.trim_end_matches('/').to_string(),
            bot_token: settings.discord_bot_token.clone(),
        }
    }
}

#[async_trait]
impl ProfileSource for DiscordClient {
    fn protocol(&self) -> Protocol {
        Protocol::Discord
    }

    async fn lookup(&self, handle: &str) -> Result<Option<Value>, ProviderError> {
        let code = invite_code(handle);
        if code.is_empty() {
            debug!(handle, "No Discord invite code in handle");
            return Ok(None);
        }
        let url = format!(
            "{}/invites/{}?with_counts=true",
            self.base_url,
            urlencoding::encode(code)
        );
        debug!(code, "Looking up Discord invite");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.bot_token {
            request = request.header("Authorization", format!("Bot {token}"));
        }

        read_json(request.send().await?).await
    }

    fn normalize(&self, raw: &Value) -> ProfileStats {
        adapt(raw)
    }
}

/// Accept bare codes as well as `discord.gg/<code>` and
/// `discord.com/invite/<code>` links
fn invite_code(handle: &str) -> &str {
    let handle = handle.trim();
    let link = handle.split_once("://").map_or(handle, |(_, rest)| rest);
    match link.split_once('/') {
        // host/path: the code is the last path segment
        Some((_, path)) => path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default(),
        // A bare host such as `discord.gg` carries no code
        None if link.contains('.') => "",
        None => link,
    }
}

/// `approximate_member_count` -> followers; verified or partnered guilds
/// count as verified
pub(crate) fn adapt(invite: &Value) -> ProfileStats {
    let verified = invite
        .pointer("/guild/features")
        .and_then(Value::as_array)
        .is_some_and(|features| {
            features
                .iter()
                .filter_map(Value::as_str)
                .any(|f| VERIFIED_FEATURES.contains(&f))
        });

    ProfileStats {
        followers: as_count(invite.get("approximate_member_count")),
        verified,
    }
}
