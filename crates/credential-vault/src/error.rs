//! Error types for the credential vault

use std::fmt;

/// Errors produced by the vault
#[derive(Debug)]
pub enum VaultError {
    /// The secret needed for key derivation is missing or unusable.
    /// Fatal: callers should abort rather than retry.
    Configuration(String),
    /// The cipher refused to encrypt
    Encryption,
    /// Key mismatch or corrupted blob. Recoverable: the credential must be
    /// entered again.
    Decryption(&'static str),
    /// Decrypted plaintext does not match its stored hash
    IntegrityMismatch,
}

impl VaultError {
    /// Whether the caller can recover (e.g. by asking for the credential again)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decryption(_) | Self::IntegrityMismatch)
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::Encryption => write!(f, "Encryption failed"),
            Self::Decryption(reason) => write!(f, "Decryption failed: {reason}"),
            Self::IntegrityMismatch => write!(f, "Credential hash mismatch"),
        }
    }
}

impl std::error::Error for VaultError {}

pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = VaultError::Configuration("CREDENTIAL_SECRET is not set".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: CREDENTIAL_SECRET is not set"
        );
    }

    #[test]
    fn test_decryption_error_display() {
        let err = VaultError::Decryption("authentication failed");
        assert_eq!(format!("{}", err), "Decryption failed: authentication failed");
    }

    #[test]
    fn test_recoverability() {
        assert!(!VaultError::Configuration("missing".into()).is_recoverable());
        assert!(!VaultError::Encryption.is_recoverable());
        assert!(VaultError::Decryption("bad").is_recoverable());
        assert!(VaultError::IntegrityMismatch.is_recoverable());
    }
}
