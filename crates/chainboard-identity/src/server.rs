//! HTTP server for the identity service
//!
//! Provides /health and /api/socials.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use social_identity::{AggregateCache, IdentityError, SocialHandleSet};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::types::{CacheSummary, ErrorResponse, HealthResponse, SocialsResponse};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: AggregateCache,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: AggregateCache) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/socials", get(get_socials))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: CacheSummary {
            entries: state.cache.entry_count(),
            ttl_secs: state.cache.ttl().as_secs(),
        },
    })
}

/// Aggregate the handles given as query parameters, e.g.
/// `/api/socials?farcaster=dwr&lens=stani.lens&refresh=true`
async fn get_socials(
    State(state): State<SharedState>,
    Query(mut params): Query<BTreeMap<String, String>>,
) -> Response {
    let refresh = params
        .remove("refresh")
        .is_some_and(|v| v == "true" || v == "1");

    let handles = match SocialHandleSet::try_from(params) {
        Ok(handles) if handles.is_empty() => {
            return bad_request("At least one social handle is required".to_string());
        }
        Ok(handles) => handles,
        Err(e) => return bad_request(e.to_string()),
    };

    let outcome = if refresh {
        state.cache.refresh(&handles).await
    } else {
        state.cache.get(&handles).await
    };

    match outcome {
        Ok(aggregated) => {
            let aggregate = aggregated.result.as_ref();
            let ttl = chrono::Duration::seconds(state.cache.ttl().as_secs() as i64);
            let cache_header = if aggregated.from_cache { "HIT" } else { "MISS" };

            let body = SocialsResponse {
                aggregate,
                from_cache: aggregated.from_cache,
                has_errors: aggregate.has_errors(),
                stale_at: aggregate.fetched_at + ttl,
            };

            (
                StatusCode::OK,
                [
                    (header::CACHE_CONTROL, "no-store"),
                    (header::HeaderName::from_static("x-cache"), cache_header),
                ],
                Json(body),
            )
                .into_response()
        }
        Err(IdentityError::MalformedInput(msg)) => bad_request(msg),
        Err(e) => {
            error!(error = %e, "Social aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    warn!(error = %error, "Rejected social handle set");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
