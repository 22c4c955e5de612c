//! # Keccak-256 digest computation
//!
//! Computes [`ContentDigest`] values from [`CanonicalBytes`]. Keccak-256 is
//! the digest the wire formats fix: DID document hashes anchor on
//! EVM-compatible chains, and signature digests use the same primitive.
//!
//! ## Security Invariant
//!
//! [`keccak256_digest`] requires `CanonicalBytes` — not raw `&[u8]` — so
//! every content digest in the workspace was computed from properly
//! canonicalized data. The raw [`keccak256`] helper exists for the
//! signature layer, which prefixes its input before hashing.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::canonical::CanonicalBytes;

/// Compute the Keccak-256 hash of raw bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute a Keccak-256 content digest from canonical bytes.
///
/// This is the only sanctioned path for producing content-addressed
/// digests of structured values.
pub fn keccak256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest(keccak256(data.as_bytes()))
}

/// A 32-byte Keccak-256 content digest.
///
/// Serializes as a `0x`-prefixed lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}
