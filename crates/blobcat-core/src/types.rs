//! Strong type definitions for blobcat.
//!
//! Identifiers are newtypes so a CID can never be confused with an arbitrary
//! string, and a range id can never be confused with a CID.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A content identifier naming an object in the content store.
///
/// The CID is opaque to blobcat; only the shape needed to pass it safely as a
/// single command-line argument is checked. A value starting with `-` would be
/// parsed as a flag by the store CLI, and `/` would escape the `/ipfs/<cid>`
/// path used by stat queries.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Validate and wrap a CID string.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("empty")
        } else if value.starts_with('-') {
            Some("leading '-'")
        } else if value.contains('/') {
            Some("contains '/'")
        } else if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("contains whitespace or control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidContentId { value, reason }),
            None => Ok(Self(value)),
        }
    }

    /// Get the CID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/ipfs/<cid>` path used by stat queries.
    pub fn ipfs_path(&self) -> String {
        format!("/ipfs/{}", self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ContentId> for String {
    fn from(cid: ContentId) -> Self {
        cid.0
    }
}

/// A 32-byte sub-range identifier, computed as
/// SHA-256(`"{cid}-{offset}-{length}"`).
///
/// Consumers use the hex form as a cache/dedup key for one fetched range, so
/// the preimage format is fixed: changing it invalidates every existing key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeId(pub [u8; 32]);

impl RangeId {
    /// Derive the identifier of `[offset, offset+length)` of `cid`.
    pub fn derive(cid: &ContentId, offset: u64, length: u64) -> Self {
        let preimage = format!("{}-{}-{}", cid.as_str(), offset, length);
        Self(Sha256::digest(preimage.as_bytes()).into())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
