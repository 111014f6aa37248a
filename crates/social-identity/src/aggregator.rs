//! Concurrent fan-out over provider clients with a barrier join

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{IdentityError, ProviderError, Result};
use crate::providers::{default_sources, ProfileSource, ProviderSettings};
use crate::types::{AggregateResult, ProviderProfile, Protocol, SocialHandleSet};

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600; // 1 hour

/// Aggregation settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound on each provider lookup
    pub provider_timeout: Duration,
    /// How long [`crate::AggregateCache`] serves a result before refetching
    pub cache_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Fetches every requested protocol concurrently and merges the results
pub struct Aggregator {
    sources: HashMap<Protocol, Arc<dyn ProfileSource>>,
    provider_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator with no providers registered
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            sources: HashMap::new(),
            provider_timeout: config.provider_timeout,
        }
    }

    /// Create an aggregator with the built-in client for every protocol
    pub fn with_default_sources(config: AggregatorConfig, settings: &ProviderSettings) -> Self {
        default_sources(settings)
            .into_iter()
            .fold(Self::new(config), Self::with_source)
    }

    /// Register `source`, replacing any existing source for its protocol
    pub fn with_source(mut self, source: Arc<dyn ProfileSource>) -> Self {
        self.sources.insert(source.protocol(), source);
        self
    }

    pub fn has_source(&self, protocol: Protocol) -> bool {
        self.sources.contains_key(&protocol)
    }

    /// Look up every handle in `handles` and normalize the results
    ///
    /// Provider failures are recorded per protocol; the returned result
    /// always has exactly one entry per requested protocol. Only an invalid
    /// handle set or a panicking adapter is returned as an error.
    ///
    /// Dropping the returned future aborts every lookup still in flight.
    pub async fn aggregate(&self, handles: &SocialHandleSet) -> Result<AggregateResult> {
        handles.validate()?;

        let mut profiles = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for (protocol, handle) in handles.iter() {
            let Some(source) = self.sources.get(&protocol).cloned() else {
                warn!(%protocol, error = %ProviderError::Unregistered(protocol), "Skipping protocol");
                profiles.insert(protocol, ProviderProfile::error(protocol));
                continue;
            };

            let handle = handle.to_string();
            let timeout = self.provider_timeout;
            tasks.spawn(async move {
                let profile = fetch_profile(source.as_ref(), &handle, timeout).await;
                (protocol, profile)
            });
        }

        // Wait for every lookup; a fast success never drops a slow slot
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((protocol, profile)) => {
                    profiles.insert(protocol, profile);
                }
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    error!(error = %message, "Profile normalization panicked");
                    return Err(IdentityError::Normalization(message));
                }
                Err(e) => {
                    warn!(error = %e, "Provider lookup cancelled");
                }
            }
        }

        // Cancelled tasks never report back; give them an error slot
        for protocol in handles.protocols() {
            profiles
                .entry(protocol)
                .or_insert_with(|| ProviderProfile::error(protocol));
        }

        debug!(requested = handles.len(), "Aggregated social profiles");

        Ok(AggregateResult {
            profiles,
            fetched_at: Utc::now(),
        })
    }
}

/// Look up one handle under `timeout` and normalize whatever comes back
async fn fetch_profile(
    source: &dyn ProfileSource,
    handle: &str,
    timeout: Duration,
) -> ProviderProfile {
    let protocol = source.protocol();

    let outcome = match tokio::time::timeout(timeout, source.lookup(handle)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    };

    match outcome {
        Ok(Some(raw)) => {
            let stats = source.normalize(&raw);
            ProviderProfile::found(protocol, stats, raw)
        }
        Ok(None) => {
            debug!(%protocol, handle, "Profile not found");
            ProviderProfile::not_found(protocol)
        }
        Err(e) => {
            warn!(%protocol, handle, error = %e, "Provider lookup failed");
            ProviderProfile::error(protocol)
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "adapter panicked".to_string()
    }
}
