//! Vault configuration and key derivation

use std::env;
use std::fmt;

use tracing::debug;
use zeroize::Zeroize;

use crate::error::{Result, VaultError};

/// Environment variable holding the secret the vault key is derived from
pub const SECRET_ENV_VAR: &str = "CREDENTIAL_SECRET";

/// Fixed application salt. The configured secret is the only variable input,
/// so the derived key is stable across restarts.
const KEY_SALT: &[u8] = b"chainboard/credential-vault/v1";

/// Argon2id memory cost in KiB (19 MiB)
const ARGON2_M_COST: u32 = 19_456;
/// Argon2id time cost (iterations)
const ARGON2_T_COST: u32 = 2;
/// Argon2id parallelism
const ARGON2_P_COST: u32 = 1;

/// Vault configuration, built once at startup and passed to [`crate::Vault::new`]
#[derive(Clone)]
pub struct VaultConfig {
    secret: String,
}

impl VaultConfig {
    /// Build a configuration from an explicit secret
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(VaultError::Configuration(format!(
                "{SECRET_ENV_VAR} must not be empty"
            )));
        }
        Ok(Self { secret })
    }

    /// Read the secret from `CREDENTIAL_SECRET`
    pub fn from_env() -> Result<Self> {
        let secret = env::var(SECRET_ENV_VAR)
            .map_err(|_| VaultError::Configuration(format!("{SECRET_ENV_VAR} is not set")))?;
        Self::new(secret)
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Drop for VaultConfig {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// 256-bit key derived from the configured secret with Argon2id
pub struct DerivedKey {
    bytes: [u8; 32],
}

impl DerivedKey {
    /// Derive the key. Deterministic for a given secret.
    pub fn derive(config: &VaultConfig) -> Result<Self> {
        let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(|e| VaultError::Configuration(format!("invalid KDF parameters: {e}")))?;
        let argon2 =
            argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut bytes = [0u8; 32];
        argon2
            .hash_password_into(config.secret(), KEY_SALT, &mut bytes)
            .map_err(|e| VaultError::Configuration(format!("key derivation failed: {e}")))?;

        debug!("Derived credential vault key");
        Ok(Self { bytes })
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
