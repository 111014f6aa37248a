//! Time-bounded aggregate cache with request coalescing

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::aggregator::Aggregator;
use crate::error::Result;
use crate::types::{AggregateResult, SocialHandleSet};

const MAX_ENTRIES: u64 = 10_000;

/// An aggregate plus where it came from
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub result: Arc<AggregateResult>,
    /// `true` when served from the cache (including when this call waited
    /// on another caller's in-flight lookup)
    pub from_cache: bool,
}

/// Caches aggregates by handle set for a fixed time
///
/// Entries expire by time only. Concurrent [`AggregateCache::get`] calls for
/// the same handle set share one in-flight aggregation. An aggregate with
/// any `error` slot is handed to the callers that waited on it but is not
/// kept, so the next call retries the providers.
pub struct AggregateCache {
    aggregator: Arc<Aggregator>,
    cache: Cache<String, Arc<AggregateResult>>,
    ttl: Duration,
}

impl AggregateCache {
    pub fn new(aggregator: Arc<Aggregator>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self {
            aggregator,
            cache,
            ttl,
        }
    }

    /// Serve from the cache when fresh, otherwise aggregate once for all
    /// concurrent callers. Failed aggregations and aggregates with provider
    /// errors are not kept.
    pub async fn get(&self, handles: &SocialHandleSet) -> Result<Aggregated> {
        handles.validate()?;
        let key = handles.cache_key();

        let entry = self
            .cache
            .entry(key.clone())
            .or_try_insert_with(async {
                self.aggregator
                    .aggregate(handles)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())?;

        let from_cache = !entry.is_fresh();
        if !from_cache && entry.value().has_errors() {
            self.cache.invalidate(&key).await;
            debug!(%key, "Dropped social aggregate with provider errors");
        }
        debug!(%key, from_cache, "Served social aggregate");

        Ok(Aggregated {
            result: entry.into_value(),
            from_cache,
        })
    }

    /// Bypass the cache, aggregate now, and replace the cached entry. A
    /// refresh that hits provider errors drops the entry instead.
    pub async fn refresh(&self, handles: &SocialHandleSet) -> Result<Aggregated> {
        let result = Arc::new(self.aggregator.aggregate(handles).await?);
        let key = handles.cache_key();

        if result.has_errors() {
            self.cache.invalidate(&key).await;
        } else {
            self.cache.insert(key.clone(), result.clone()).await;
        }

        debug!(%key, has_errors = result.has_errors(), "Refreshed social aggregate");

        Ok(Aggregated {
            result,
            from_cache: false,
        })
    }

    /// Drop the cached entry for `handles`, if any
    pub async fn invalidate(&self, handles: &SocialHandleSet) {
        self.cache.invalidate(&handles.cache_key()).await;
    }

    /// Approximate number of cached aggregates
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{Behavior, FakeSource};
    use crate::aggregator::AggregatorConfig;
    use crate::types::{ProfileStatus, Protocol};
    use serde_json::json;

    fn handles() -> SocialHandleSet {
        SocialHandleSet::new()
            .with(Protocol::Farcaster, "alice")
            .unwrap()
            .with(Protocol::Lens, "alice.lens")
            .unwrap()
    }

    fn sources(delay: Duration) -> (Arc<FakeSource>, Arc<FakeSource>) {
        (
            FakeSource::delayed(
                Protocol::Farcaster,
                Behavior::Found(json!({"followerCount": 150})),
                delay,
            ),
            FakeSource::delayed(Protocol::Lens, Behavior::NotFound, delay),
        )
    }

    fn cache_with(farcaster: &Arc<FakeSource>, lens: &Arc<FakeSource>, ttl: Duration) -> AggregateCache {
        let aggregator = Aggregator::new(AggregatorConfig::default())
            .with_source(farcaster.clone())
            .with_source(lens.clone());
        AggregateCache::new(Arc::new(aggregator), ttl)
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));

        let first = cache.get(&handles()).await.unwrap();
        let second = cache.get(&handles()).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert!(Arc::ptr_eq(&first.result, &second.result));
        assert_eq!(farcaster.calls(), 1);
        assert_eq!(lens.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_coalesce() {
        let (farcaster, lens) = sources(Duration::from_millis(50));
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));
        let handles = handles();

        let (a, b) = tokio::join!(cache.get(&handles), cache.get(&handles));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(farcaster.calls(), 1);
        assert_eq!(lens.calls(), 1);
        assert!(Arc::ptr_eq(&a.result, &b.result));
        assert!(!a.from_cache || !b.from_cache);
    }

    #[tokio::test]
    async fn test_many_concurrent_callers_share_one_fetch() {
        let (farcaster, lens) = sources(Duration::from_millis(30));
        let cache = Arc::new(cache_with(&farcaster, &lens, Duration::from_secs(3600)));

        let calls = (0..8).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get(&handles()).await })
        });
        for joined in futures::future::join_all(calls).await {
            let aggregated = joined.unwrap().unwrap();
            assert_eq!(aggregated.result.len(), 2);
        }

        assert_eq!(farcaster.calls(), 1);
        assert_eq!(lens.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));

        let cached = cache.get(&handles()).await.unwrap();
        let refreshed = cache.refresh(&handles()).await.unwrap();
        assert!(!refreshed.from_cache);
        assert!(!Arc::ptr_eq(&cached.result, &refreshed.result));
        assert_eq!(farcaster.calls(), 2);

        // The refreshed value replaces the old entry
        let after = cache.get(&handles()).await.unwrap();
        assert!(after.from_cache);
        assert!(Arc::ptr_eq(&after.result, &refreshed.result));
        assert_eq!(farcaster.calls(), 2);
    }

    #[tokio::test]
    async fn test_entries_expire_by_time() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_millis(50));

        cache.get(&handles()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let again = cache.get(&handles()).await.unwrap();

        assert!(!again.from_cache);
        assert_eq!(farcaster.calls(), 2);
    }

    #[tokio::test]
    async fn test_different_handle_sets_are_cached_separately() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));

        cache.get(&handles()).await.unwrap();
        let other = SocialHandleSet::new()
            .with(Protocol::Farcaster, "bob")
            .unwrap();
        let result = cache.get(&other).await.unwrap();

        assert!(!result.from_cache);
        assert_eq!(result.result.len(), 1);
        assert_eq!(farcaster.calls(), 2);
        assert_eq!(lens.calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_failures_are_not_kept() {
        let failing = FakeSource::new(Protocol::Twitter, Behavior::Fail);
        let aggregator = Aggregator::new(AggregatorConfig::default()).with_source(failing.clone());
        let cache = AggregateCache::new(Arc::new(aggregator), Duration::from_secs(3600));
        let handles = SocialHandleSet::new().with(Protocol::Twitter, "bob").unwrap();

        let aggregated = cache.get(&handles).await.unwrap();
        assert_eq!(
            aggregated.result.get(Protocol::Twitter).unwrap().status,
            ProfileStatus::Error
        );
        assert!(aggregated.result.has_errors());

        let retry = cache.get(&handles).await.unwrap();
        assert!(!retry.from_cache);
        assert_eq!(failing.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_after_provider_timeout_fetches_again() {
        let hanging = FakeSource::new(Protocol::Twitter, Behavior::Hang);
        let aggregator = Aggregator::new(AggregatorConfig {
            provider_timeout: Duration::from_millis(50),
            ..AggregatorConfig::default()
        })
        .with_source(hanging.clone());
        let cache = AggregateCache::new(Arc::new(aggregator), Duration::from_secs(3600));
        let handles = SocialHandleSet::new().with(Protocol::Twitter, "bob").unwrap();

        let first = cache.get(&handles).await.unwrap();
        assert_eq!(
            first.result.get(Protocol::Twitter).unwrap().status,
            ProfileStatus::Error
        );

        let retry = cache.get(&handles).await.unwrap();
        assert!(!retry.from_cache);
        assert_eq!(hanging.calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_with_errors_drops_entry() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));
        let with_twitter = handles().with(Protocol::Twitter, "bob").unwrap();

        // No twitter source is registered, so every aggregate has an error slot
        let refreshed = cache.refresh(&with_twitter).await.unwrap();
        assert!(refreshed.result.has_errors());

        let again = cache.get(&with_twitter).await.unwrap();
        assert!(!again.from_cache);
        assert_eq!(farcaster.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (farcaster, lens) = sources(Duration::ZERO);
        let cache = cache_with(&farcaster, &lens, Duration::from_secs(3600));

        cache.get(&handles()).await.unwrap();
        cache.invalidate(&handles()).await;
        let again = cache.get(&handles()).await.unwrap();

        assert!(!again.from_cache);
        assert_eq!(farcaster.calls(), 2);
    }
}
