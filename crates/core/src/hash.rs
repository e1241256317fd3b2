//! BLAKE3 hashing primitives and fork identifier generation

use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a generated fork id, in hex characters
pub const FORK_ID_LEN: usize = 12;

/// Seed used in place of a parent id when generating ids for root forks
pub const ROOT_SEED: &str = "root";

/// A BLAKE3 hash (32 bytes)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Blake3Hash([u8; 32]);

impl Blake3Hash {
    /// Create a new Blake3Hash from bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Leading `len` hex characters of the digest
    ///
    /// `len` is clamped to the full 64-character digest.
    pub fn short_hex(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl std::fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Blake3Hash({})", self.to_hex())
    }
}

impl std::fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash bytes using BLAKE3
pub fn hash_bytes(data: &[u8]) -> Blake3Hash {
    let hash = blake3::hash(data);
    Blake3Hash::from_bytes(*hash.as_bytes())
}

/// Derive a fork id from a parent id and a nanosecond timestamp
///
/// The seed is `"<parent or root>-<nanos>"`; the id is the first
/// [`FORK_ID_LEN`] hex characters of its BLAKE3 digest. An empty parent
/// is treated like no parent.
pub fn fork_id_at(parent: Option<&str>, nanos: u128) -> String {
    let parent = parent.filter(|p| !p.is_empty()).unwrap_or(ROOT_SEED);
    let seed = format!("{}-{}", parent, nanos);
    hash_bytes(seed.as_bytes()).short_hex(FORK_ID_LEN)
}

/// Generate a fork id from the current wall clock
///
/// Uniqueness is not guaranteed: two calls landing on the same clock tick
/// with the same parent produce the same id. Callers that need a fresh id
/// must check the store and retry.
pub fn generate_fork_id(parent: Option<&str>) -> String {
    fork_id_at(parent, now_nanos())
}

/// Nanoseconds since the UNIX epoch (0 if the clock is before the epoch)
pub fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
