//! Core types for social identity aggregation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{IdentityError, Result};

/// Longest handle accepted from callers
const MAX_HANDLE_LEN: usize = 256;

/// A social or identity platform a project can link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Farcaster,
    Lens,
    Twitter,
    Discord,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [
        Protocol::Farcaster,
        Protocol::Lens,
        Protocol::Twitter,
        Protocol::Discord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farcaster => "farcaster",
            Self::Lens => "lens",
            Self::Twitter => "twitter",
            Self::Discord => "discord",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farcaster" => Ok(Self::Farcaster),
            "lens" => Ok(Self::Lens),
            // "x" is what the dashboard's project form stores
            "twitter" | "x" => Ok(Self::Twitter),
            "discord" => Ok(Self::Discord),
            other => Err(IdentityError::MalformedInput(format!(
                "unknown protocol '{other}'"
            ))),
        }
    }
}

/// Handles to look up, keyed by protocol
///
/// Protocols without an entry are not queried. Handles are trimmed and must
/// be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct SocialHandleSet {
    handles: BTreeMap<Protocol, String>,
}

impl SocialHandleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SocialHandleSet::insert`]
    pub fn with(mut self, protocol: Protocol, handle: impl Into<String>) -> Result<Self> {
        self.insert(protocol, handle)?;
        Ok(self)
    }

    /// Add or replace the handle for `protocol`
    pub fn insert(&mut self, protocol: Protocol, handle: impl Into<String>) -> Result<()> {
        let handle = handle.into();
        let handle = handle.trim();
        validate_handle(protocol, handle)?;
        self.handles.insert(protocol, handle.to_string());
        Ok(())
    }

    pub fn get(&self, protocol: Protocol) -> Option<&str> {
        self.handles.get(&protocol).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Protocol, &str)> {
        self.handles.iter().map(|(p, h)| (*p, h.as_str()))
    }

    pub fn protocols(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.handles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Re-check every entry
    pub fn validate(&self) -> Result<()> {
        self.handles
            .iter()
            .try_for_each(|(protocol, handle)| validate_handle(*protocol, handle))
    }

    /// Canonical serialization used as the cache key. Entries are ordered by
    /// protocol so equal sets always give equal keys.
    pub fn cache_key(&self) -> String {
        self.handles
            .iter()
            .map(|(protocol, handle)| format!("{protocol}={}", urlencoding::encode(handle)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn validate_handle(protocol: Protocol, handle: &str) -> Result<()> {
    if handle.is_empty() {
        return Err(IdentityError::MalformedInput(format!(
            "empty handle for {protocol}"
        )));
    }
    if handle.len() > MAX_HANDLE_LEN {
        return Err(IdentityError::MalformedInput(format!(
            "handle for {protocol} exceeds {MAX_HANDLE_LEN} bytes"
        )));
    }
    if handle.chars().any(char::is_control) {
        return Err(IdentityError::MalformedInput(format!(
            "handle for {protocol} contains control characters"
        )));
    }
    Ok(())
}

impl TryFrom<BTreeMap<String, String>> for SocialHandleSet {
    type Error = IdentityError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self> {
        let mut set = Self::new();
        for (name, handle) in map {
            let protocol: Protocol = name.parse()?;
            if set.get(protocol).is_some() {
                return Err(IdentityError::MalformedInput(format!(
                    "duplicate entry for {protocol}"
                )));
            }
            set.insert(protocol, handle)?;
        }
        Ok(set)
    }
}

impl Serialize for SocialHandleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.handles.serialize(serializer)
    }
}

/// Outcome of one provider lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileStatus {
    Ok,
    NotFound,
    Error,
}

/// What a provider adapter extracts from the provider's raw profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub followers: Option<u64>,
    pub verified: bool,
}

/// Normalized result for one protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default)]
    pub verified: bool,
    /// The provider's own profile object, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    pub fetched_at: DateTime<Utc>,
    pub status: ProfileStatus,
}

impl ProviderProfile {
    pub fn found(protocol: Protocol, stats: ProfileStats, raw: Value) -> Self {
        Self {
            protocol,
            followers: stats.followers,
            verified: stats.verified,
            raw: Some(raw),
            fetched_at: Utc::now(),
            status: ProfileStatus::Ok,
        }
    }

    pub fn not_found(protocol: Protocol) -> Self {
        Self::empty(protocol, ProfileStatus::NotFound)
    }

    pub fn error(protocol: Protocol) -> Self {
        Self::empty(protocol, ProfileStatus::Error)
    }

    fn empty(protocol: Protocol, status: ProfileStatus) -> Self {
        Self {
            protocol,
            followers: None,
            verified: false,
            raw: None,
            fetched_at: Utc::now(),
            status,
        }
    }
}

/// One [`ProviderProfile`] per requested protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub profiles: BTreeMap<Protocol, ProviderProfile>,
    pub fetched_at: DateTime<Utc>,
}

impl AggregateResult {
    pub fn get(&self, protocol: Protocol) -> Option<&ProviderProfile> {
        self.profiles.get(&protocol)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Whether any provider failed
    pub fn has_errors(&self) -> bool {
        self.profiles
            .values()
            .any(|p| p.status == ProfileStatus::Error)
    }

    /// Whether the result is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        (Utc::now() - self.fetched_at)
            .to_std()
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}
