//! Content and spec identity hashes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of an object's bytes.
///
/// Two uploads with identical bytes always produce the same hash, which is
/// what makes storage content addressed.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of a hex encoded SHA-256 digest.
    pub const LEN: usize = 64;

    /// Compute the hash of `data`.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-level shard directories: `(hash[0:2], hash[2:4])`.
    pub fn shards(&self) -> (&str, &str) {
        (&self.0[0..2], &self.0[2..4])
    }
}

impl std::str::FromStr for ContentHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != Self::LEN {
            return Err(format!(
                "Content hash must be {} hex characters, got {}",
                Self::LEN,
                s.len()
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("Content hash is not hex: {}", s));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// Short stable identity of a [`ThumbnailSpec`](crate::ThumbnailSpec).
///
/// First 16 hex characters of the SHA-256 of the spec's canonical form.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct SpecHash(String);

impl SpecHash {
    const LEN: usize = 16;

    pub(crate) fn of_canonical(canonical: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let mut hex = format!("{:x}", hasher.finalize());
        hex.truncate(Self::LEN);
        Self(hex)
    }

    /// Hex string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
