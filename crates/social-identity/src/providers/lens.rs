//! Lens profiles via the Lens v2 GraphQL API

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{as_count, bare_handle, http_client, ProfileSource, ProviderSettings};
use crate::error::ProviderError;
use crate::types::{ProfileStats, Protocol};

const PROFILE_QUERY: &str = r#"query Profile($handle: Handle!) {
  profile(request: { forHandle: $handle }) {
    id
    handle { fullHandle localName }
    metadata { displayName bio }
    stats { followers following posts }
  }
}"#;

/// Looks up Lens profiles by handle
pub struct LensClient {
    http: reqwest::Client,
    api_url: String,
}

impl LensClient {
    pub const DEFAULT_API_URL: &'static str = "https://api-v2.lens.dev";

    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            http: http_client(settings),
            api_url: settings.lens_url.clone(),
        }
    }
}

#[async_trait]
impl ProfileSource for LensClient {
    fn protocol(&self) -> Protocol {
        Protocol::Lens
    }

    async fn lookup(&self, handle: &str) -> Result<Option<Value>, ProviderError> {
        if bare_handle(handle).is_empty() {
            debug!(handle, "Empty Lens handle");
            return Ok(None);
        }
        let full_handle = full_handle(handle);
        debug!(handle = %full_handle, "Looking up Lens profile");

        let response = self
            .http
            .post(&self.api_url)
            .json(&json!({
                "query": PROFILE_QUERY,
                "variables": { "handle": full_handle },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        extract_profile(body)
    }

    fn normalize(&self, raw: &Value) -> ProfileStats {
        adapt(raw)
    }
}

/// Lens v2 handles are namespaced: `stani.lens`, `@stani` and `lens/stani`
/// all become `lens/stani`
fn full_handle(handle: &str) -> String {
    let handle = bare_handle(handle);
    if handle.contains('/') {
        return handle.to_string();
    }
    format!("lens/{}", handle.strip_suffix(".lens").unwrap_or(handle))
}

/// GraphQL errors come back with a 200 status; a null profile means the
/// handle is unknown
fn extract_profile(mut body: Value) -> Result<Option<Value>, ProviderError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors[0]
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error");
            return Err(ProviderError::Api(message.to_string()));
        }
    }

    match body.pointer_mut("/data/profile").map(Value::take) {
        Some(Value::Null) | None => Ok(None),
        Some(profile) => Ok(Some(profile)),
    }
}

/// `stats.followers` -> followers. Lens has no verification flag.
pub(crate) fn adapt(profile: &Value) -> ProfileStats {
    ProfileStats {
        followers: as_count(profile.pointer("/stats/followers")),
        verified: false,
    }
}
