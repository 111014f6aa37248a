//! SHA-256 integrity hashing

use sha2::{Digest, Sha256};

/// Hash `data` to a fixed-length lowercase hex SHA-256 digest
pub fn hash(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Check `data` against a digest produced by [`hash`] without short-circuiting
/// on the first differing byte
pub fn verify_hash(data: &str, expected: &str) -> bool {
    let actual = hash(data);
    if actual.len() != expected.len() {
        return false;
    }
    actual
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
