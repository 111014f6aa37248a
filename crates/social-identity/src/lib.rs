//! Social identity aggregation
//!
//! Looks up a project's profiles on several social protocols at once and
//! normalizes them into one [`AggregateResult`]:
//!
//! - Farcaster via the Warpcast public API
//! - Lens via the Lens v2 GraphQL API
//! - Twitter/X via the v2 users endpoint (bearer token)
//! - Discord via invite lookups with member counts
//!
//! Every requested protocol always gets a slot in the result. Provider
//! failures, timeouts and cancellations are recorded per protocol as
//! [`ProfileStatus::Error`] instead of failing the whole call.
//! [`AggregateCache`] adds a time-bounded moka cache on top, coalescing
//! concurrent lookups of the same handle set.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use social_identity::{
//!     Aggregator, AggregatorConfig, AggregateCache, Protocol, ProviderSettings, SocialHandleSet,
//! };
//!
//! # async fn example() -> Result<(), social_identity::IdentityError> {
//! let aggregator = Aggregator::with_default_sources(
//!     AggregatorConfig::default(),
//!     &ProviderSettings::default(),
//! );
//! let cache = AggregateCache::new(Arc::new(aggregator), AggregatorConfig::default().cache_ttl);
//!
//! let handles = SocialHandleSet::new()
//!     .with(Protocol::Farcaster, "dwr")?
//!     .with(Protocol::Lens, "stani.lens")?;
//!
//! let aggregated = cache.get(&handles).await?;
//! for (protocol, profile) in &aggregated.result.profiles {
//!     println!("{protocol}: {:?} followers ({:?})", profile.followers, profile.status);
//! }
//! # Ok(())
//! # }
//! ```

mod aggregator;
mod cache;
mod error;
pub mod providers;
mod types;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use cache::{AggregateCache, Aggregated};
pub use error::{IdentityError, ProviderError, Result};
pub use providers::{ProfileSource, ProviderSettings};
pub use types::{
    AggregateResult, ProfileStats, ProfileStatus, Protocol, ProviderProfile, SocialHandleSet,
};
