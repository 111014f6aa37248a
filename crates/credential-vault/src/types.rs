//! Vault value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ciphertext produced by [`crate::Vault::encrypt`]
///
/// Base64 of `version (1 byte) || nonce (12 bytes) || ciphertext || tag (16 bytes)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncryptedBlob {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A blob together with the hash of its plaintext, as persisted by the
/// external credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedCredential {
    pub blob: EncryptedBlob,
    pub hash: String,
}
