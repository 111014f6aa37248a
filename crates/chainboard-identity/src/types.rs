//! Response types for the identity service

use chrono::{DateTime, Utc};
use serde::Serialize;
use social_identity::AggregateResult;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheSummary,
}

#[derive(Debug, Default, Serialize)]
pub struct CacheSummary {
    pub entries: u64,
    pub ttl_secs: u64,
}

/// Aggregated profiles plus the flags the dashboard uses to decide what to
/// render and when to revalidate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialsResponse<'a> {
    #[serde(flatten)]
    pub aggregate: &'a AggregateResult,
    pub from_cache: bool,
    pub has_errors: bool,
    pub stale_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
