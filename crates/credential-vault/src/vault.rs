//! AES-256-GCM encryption of small secrets

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::digest;
use crate::error::{Result, VaultError};
use crate::key::{DerivedKey, VaultConfig};
use crate::types::{EncryptedBlob, SealedCredential};

/// Blob format version
const BLOB_VERSION: u8 = 0x01;
/// AES-GCM nonce size (96 bits)
const NONCE_SIZE: usize = 12;
/// AES-GCM authentication tag size
const TAG_SIZE: usize = 16;

/// Encrypts, decrypts and hashes opaque secrets under a key derived once
/// at construction
pub struct Vault {
    cipher: Aes256Gcm,
}

impl Vault {
    /// Derive the key from `config` and build the vault
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let key = DerivedKey::derive(config)?;
        Ok(Self::with_key(&key))
    }

    /// Build the vault from an already derived key
    pub fn with_key(key: &DerivedKey) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypt a secret. Empty or absent input yields `Ok(None)` without
    /// touching the cipher.
    ///
    /// Every call uses a fresh random nonce, so encrypting the same token
    /// twice gives two different blobs.
    pub fn encrypt<'a>(
        &self,
        plaintext: impl Into<Option<&'a str>>,
    ) -> Result<Option<EncryptedBlob>> {
        let plaintext = match plaintext.into() {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(None),
        };

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encryption)?;

        let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        out.push(BLOB_VERSION);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);

        Ok(Some(EncryptedBlob::from(STANDARD.encode(out))))
    }

    /// Decrypt a blob. Empty or absent input yields `Ok(None)`.
    ///
    /// A wrong key, a corrupted blob, or a plaintext that decodes to nothing
    /// or to invalid UTF-8 is a [`VaultError::Decryption`].
    pub fn decrypt<'a>(&self, blob: impl Into<Option<&'a str>>) -> Result<Option<String>> {
        let blob = match blob.into() {
            Some(b) if !b.is_empty() => b,
            _ => return Ok(None),
        };

        let data = STANDARD
            .decode(blob)
            .map_err(|_| VaultError::Decryption("blob is not valid base64"))?;

        if data.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::Decryption("blob too short"));
        }
        if data[0] != BLOB_VERSION {
            return Err(VaultError::Decryption("unknown blob version"));
        }

        let (nonce, ciphertext) = data[1..].split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                warn!("Credential blob failed authentication");
                VaultError::Decryption("wrong key or corrupted blob")
            })?;

        let text = String::from_utf8(plaintext)
            .map_err(|_| VaultError::Decryption("plaintext is not valid UTF-8"))?;
        if text.is_empty() {
            return Err(VaultError::Decryption("plaintext is empty"));
        }

        Ok(Some(text))
    }

    /// SHA-256 hex digest of `data`
    pub fn hash(&self, data: &str) -> String {
        digest::hash(data)
    }

    /// Encrypt and hash a secret in one step
    pub fn seal<'a>(
        &self,
        plaintext: impl Into<Option<&'a str>>,
    ) -> Result<Option<SealedCredential>> {
        let plaintext = plaintext.into();
        let Some(blob) = self.encrypt(plaintext)? else {
            return Ok(None);
        };
        let hash = digest::hash(plaintext.unwrap_or_default());
        Ok(Some(SealedCredential { blob, hash }))
    }

    /// Decrypt a sealed credential and check it against its stored hash
    pub fn unseal(&self, sealed: &SealedCredential) -> Result<String> {
        let plaintext = self
            .decrypt(sealed.blob.as_str())?
            .ok_or(VaultError::Decryption("blob is empty"))?;

        if !digest::verify_hash(&plaintext, &sealed.hash) {
            warn!("Unsealed credential does not match its stored hash");
            return Err(VaultError::IntegrityMismatch);
        }

        Ok(plaintext)
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}
