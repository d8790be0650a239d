//! Deterministic content hashing (SHA-256, lowercase hex).
//!
//! Full-length hashes gate change detection; the short prefix names storage
//! objects. Collisions at the short length are an accepted tradeoff since
//! equality comparisons always use the full hash.

use sha2::{Digest, Sha256};

/// Hex length of storage object names.
pub const SHORT_HASH_LEN: usize = 16;

#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[must_use]
pub fn hash_text(text: &str) -> String {
    hash_bytes(text.as_bytes())
}

/// Truncated hash used for content-addressed object names.
#[must_use]
pub fn short_hash(data: &[u8]) -> String {
    let mut hash = hash_bytes(data);
    hash.truncate(SHORT_HASH_LEN);
    hash
}
