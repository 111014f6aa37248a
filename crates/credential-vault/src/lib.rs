//! Credential Vault
//!
//! Protects small opaque secrets (GitHub access tokens, provider API keys)
//! before they are handed to an external key-value store. Secrets are
//! encrypted with AES-256-GCM under a key derived once from the configured
//! `CREDENTIAL_SECRET`, and hashed with SHA-256 so tampering can be detected
//! without exposing the plaintext.
//!
//! The vault never persists anything itself.
//!
//! # Example
//!
//! ```no_run
//! use credential_vault::{Vault, VaultConfig};
//!
//! # fn example() -> Result<(), credential_vault::VaultError> {
//! let vault = Vault::new(&VaultConfig::from_env()?)?;
//!
//! if let Some(blob) = vault.encrypt("ghp_example")? {
//!     let token = vault.decrypt(blob.as_str())?;
//!     assert_eq!(token.as_deref(), Some("ghp_example"));
//! }
//! # Ok(())
//! # }
//! ```

mod digest;
mod error;
mod key;
mod types;
mod vault;

pub use digest::{hash, verify_hash};
pub use error::{Result, VaultError};
pub use key::{DerivedKey, VaultConfig, SECRET_ENV_VAR};
pub use types::{EncryptedBlob, SealedCredential};
pub use vault::Vault;
