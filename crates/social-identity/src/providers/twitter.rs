//! Twitter/X profiles via the v2 users endpoint

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{as_count, bare_handle, http_client, read_json, ProfileSource, ProviderSettings};
use crate::error::ProviderError;
use crate::types::{ProfileStats, Protocol};

const USER_FIELDS: &str = "public_metrics,verified,description,profile_image_url";

/// Looks up Twitter/X users by username. Requires an app bearer token.
pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl TwitterClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.twitter.com";

    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            http: http_client(settings),
            base_url: settings.twitter_url.trim_end_matches('/').to_string(),
            bearer_token: settings.twitter_bearer_token.clone(),
        }
    }
}

#[async_trait]
impl ProfileSource for TwitterClient {
    fn protocol(&self) -> Protocol {
        Protocol::Twitter
    }

    async fn lookup(&self, handle: &str) -> Result<Option<Value>, ProviderError> {
        let username = bare_handle(handle);
        if username.is_empty() {
            debug!(handle, "Empty Twitter username");
            return Ok(None);
        }

        let token = self
            .bearer_token
            .as_deref()
            .ok_or(ProviderError::MissingCredential("twitter bearer token"))?;

        let url = format!(
            "{}/2/users/by/username/{}?user.fields={USER_FIELDS}",
            self.base_url,
            urlencoding::encode(username)
        );
        debug!(username, "Looking up Twitter user");

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let Some(body) = read_json(response).await? else {
            return Ok(None);
        };
        Ok(extract_user(body))
    }

    fn normalize(&self, raw: &Value) -> ProfileStats {
        adapt(raw)
    }
}

/// Unknown usernames come back as 200 with an `errors` array and no `data`
fn extract_user(mut body: Value) -> Option<Value> {
    match body.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(user) => Some(user),
    }
}

/// `public_metrics.followers_count` -> followers, `verified` -> verified
pub(crate) fn adapt(user: &Value) -> ProfileStats {
    ProfileStats {
        followers: as_count(user.pointer("/public_metrics/followers_count")),
        verified: user
            .get("verified")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server::serve;
    use axum::extract::Path;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    const TOKEN: &str = "AAAA-test-bearer";

    async fn user_by_username(
        Path(username): Path<String>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TOKEN}"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"title": "Unauthorized"})));
        }

        match username.as_str() {
            "XDevelopers" => (
                StatusCode::OK,
                Json(json!({"data": {
                    "id": "2244994945",
                    "username": "XDevelopers",
                    "verified": true,
                    "public_metrics": {"followers_count": 513_958}
                }})),
            ),
            "ghost" => (
                StatusCode::OK,
                Json(json!({"errors": [{"title": "Not Found Error", "detail": "Could not find user"}]})),
            ),
            "suspended" => (StatusCode::NOT_FOUND, Json(json!({"title": "Not Found"}))),
            _ => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"title": "Service Unavailable"})),
            ),
        }
    }

    async fn local_client(token: &str) -> TwitterClient {
        let router = Router::new().route("/2/users/by/username/{username}", get(user_by_username));
        let base = serve(router).await;
        TwitterClient::new(&ProviderSettings {
            twitter_url: base,
            twitter_bearer_token: Some(token.to_string()),
            ..ProviderSettings::default()
        })
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let client = local_client(TOKEN).await;
        let user = client.lookup("@XDevelopers").await.unwrap().unwrap();

        let stats = client.normalize(&user);
        assert_eq!(stats.followers, Some(513_958));
        assert!(stats.verified);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let client = local_client(TOKEN).await;
        // Unknown users come back as 200 without data, suspended ones as 404
        assert!(client.lookup("ghost").await.unwrap().is_none());
        assert!(client.lookup("suspended").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_error_statuses() {
        let client = local_client(TOKEN).await;
        let err = client.lookup("busy").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status(503)));

        let client = local_client("wrong").await;
        let err = client.lookup("XDevelopers").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status(401)));
    }

    #[tokio::test]
    async fn test_lookup_empty_username_skips_request() {
        let client = local_client(TOKEN).await;
        assert!(client.lookup("@").await.unwrap().is_none());
    }

    #[test]
    fn test_adapt() {
        let stats = adapt(&json!({
            "id": "2244994945",
            "username": "XDevelopers",
            "verified": true,
            "public_metrics": {
                "followers_count": 513_958,
                "following_count": 2_039,
                "tweet_count": 3_635
            }
        }));
        assert_eq!(stats.followers, Some(513_958));
        assert!(stats.verified);
    }

    #[test]
    fn test_adapt_unverified_without_metrics() {
        let stats = adapt(&json!({"id": "1", "username": "bob"}));
        assert_eq!(stats, ProfileStats::default());
    }

    #[test]
    fn test_extract_user() {
        let body = json!({"data": {"id": "1", "username": "bob"}});
        assert_eq!(extract_user(body).unwrap()["username"], "bob");

        let body = json!({"errors": [{"title": "Not Found Error", "detail": "Could not find user"}]});
        assert!(extract_user(body).is_none());
    }

    #[tokio::test]
    async fn test_lookup_without_token_is_missing_credential() {
        let client = TwitterClient::new(&ProviderSettings::default());
        let err = client.lookup("bob").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }
}
