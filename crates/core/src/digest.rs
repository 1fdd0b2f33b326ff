//! Blob digests: a content hash paired with the blob size.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a blob in the cache by content hash and size.
///
/// Rendered as `<hex>/<size>`, the form used in cache-miss messages.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest {
    hash: ContentHash,
    size_bytes: u64,
}

impl Digest {
    /// Create a digest from its parts.
    pub fn new(hash: ContentHash, size_bytes: u64) -> Self {
        Self { hash, size_bytes }
    }

    /// Compute the digest of a blob.
    pub fn of(data: &[u8]) -> Self {
        Self {
            hash: ContentHash::compute(data),
            size_bytes: data.len() as u64,
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Check that `data` is the blob this digest names.
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() as u64 == self.size_bytes && ContentHash::compute(data) == self.hash
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}/{})", &self.hash.to_hex()[..16], self.size_bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hash, self.size_bytes)
    }
}

impl FromStr for Digest {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let (hash, size) = s
            .split_once('/')
            .ok_or_else(|| crate::Error::InvalidDigest(format!("expected <hash>/<size>: {s}")))?;
        let size_bytes = size
            .parse::<u64>()
            .map_err(|e| crate::Error::InvalidDigest(format!("invalid size in {s}: {e}")))?;
        Ok(Self::new(ContentHash::from_hex(hash)?, size_bytes))
    }
}
