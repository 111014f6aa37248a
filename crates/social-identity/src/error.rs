//! Error types for social identity aggregation

use std::fmt;
use std::time::Duration;

use crate::types::Protocol;

/// Errors that escape [`crate::Aggregator::aggregate`]
///
/// Provider failures never show up here; they are recorded on the
/// corresponding [`crate::ProviderProfile`].
#[derive(Debug, Clone)]
pub enum IdentityError {
    /// The handle set itself is invalid
    MalformedInput(String),
    /// A normalization adapter panicked
    Normalization(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput(msg) => write!(f, "Malformed handle set: {msg}"),
            Self::Normalization(msg) => write!(f, "Normalization failed: {msg}"),
        }
    }
}

impl std::error::Error for IdentityError {}

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Per-provider failure, recorded as [`crate::ProfileStatus::Error`]
#[derive(Debug)]
pub enum ProviderError {
    /// Transport failure
    Http(reqwest::Error),
    /// Provider answered with a non-success status
    Status(u16),
    /// Provider reported an error in an otherwise successful response
    Api(String),
    /// The lookup did not finish within the per-provider timeout
    Timeout(Duration),
    /// The provider needs an API secret that was not configured
    MissingCredential(&'static str),
    /// No client is registered for the protocol
    Unregistered(Protocol),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Status(code) => write!(f, "Provider returned status {code}"),
            Self::Api(msg) => write!(f, "API error: {msg}"),
            Self::Timeout(after) => write!(f, "Timed out after {}ms", after.as_millis()),
            Self::MissingCredential(name) => write!(f, "Missing credential: {name}"),
            Self::Unregistered(protocol) => write!(f, "No provider registered for {protocol}"),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}
