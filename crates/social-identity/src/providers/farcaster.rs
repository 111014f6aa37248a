//! Farcaster profiles via the Warpcast public API

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{as_count, bare_handle, http_client, read_json, ProfileSource, ProviderSettings};
use crate::error::ProviderError;
use crate::types::{ProfileStats, Protocol};

/// Looks up Farcaster users by username
pub struct FarcasterClient {
    http: reqwest::Client,
    base_url: String,
}

impl FarcasterClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.warpcast.com";

    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            http: http_client(settings),
            base_url: settings.farcaster_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProfileSource for FarcasterClient {
    fn protocol(&self) -> Protocol {
        Protocol::Farcaster
    }

    async fn lookup(&self, handle: &str) -> Result<Option<Value>, ProviderError> {
        let username = bare_handle(handle);
        if username.is_empty() {
            debug!(handle, "Empty Farcaster username");
            return Ok(None);
        }
        let url = format!(
            "{}/v2/user-by-username?username={}",
            self.base_url,
            urlencoding::encode(username)
        );
        debug!(username, "Looking up Farcaster user");

        let Some(body) = read_json(self.http.get(&url).send().await?).await? else {
            return Ok(None);
        };
        Ok(extract_user(body))
    }

    fn normalize(&self, raw: &Value) -> ProfileStats {
        adapt(raw)
    }
}

/// Warpcast wraps the user in `{"result": {"user": {...}}}` and reports
/// unknown usernames through an `errors` array instead
fn extract_user(mut body: Value) -> Option<Value> {
    match body.pointer_mut("/result/user").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(user) => Some(user),
    }
}

/// `followerCount` -> followers, `powerBadge` -> verified
pub(crate) fn adapt(user: &Value) -> ProfileStats {
    ProfileStats {
        followers: as_count(user.get("followerCount")),
        verified: user
            .get("powerBadge")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}
