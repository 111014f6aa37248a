//! Error types for the identity service

use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    Vault(credential_vault::VaultError),
    Io(Box<std::io::Error>),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ServiceError::Vault(err) => write!(f, "Vault error: {}", err),
            ServiceError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Vault(err) => Some(err),
            ServiceError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<credential_vault::VaultError> for ServiceError {
    fn from(err: credential_vault::VaultError) -> Self {
        ServiceError::Vault(err)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServiceError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
