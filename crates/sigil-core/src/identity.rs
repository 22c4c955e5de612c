//! # Identity newtypes
//!
//! Domain-primitive newtypes for the identifiers that circulate through
//! the trust engine. Each identifier is a distinct type and validates its
//! format at construction time — you cannot pass a random string where a
//! [`Did`] is expected, and a malformed address is rejected before it can
//! reach a signature check.
//!
//! ## DID format
//!
//! `did:sigil:<role>:<address>` — the method is a fixed constant, the role
//! is a lowercase alphanumeric segment, and the address is a `0x`-prefixed
//! 20-byte account address. The mapping from `(role, address)` to DID is
//! deterministic and invertible by string parsing.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The fixed DID method of this trust engine.
pub const DID_METHOD: &str = "sigil";

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address.
///
/// Accepts `0x`-prefixed 40-hex-digit strings in any case; stores raw
/// bytes, so equality is case-insensitive by construction. Displays as
/// lowercase `0x…`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Parse an address from its hex string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] unless the input is
    /// `0x` followed by exactly 40 hex digits.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let s = value.as_ref();
        let body = s
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidAddress(s.to_string()))?;
        if body.len() != 40 {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        let bytes =
            hex::decode(body).map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        Ok(Self(arr))
    }

    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role segment of a DID (e.g. `issuer`, `citizen`, `organizer`).
///
/// Lowercase ASCII alphanumeric, 1–32 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Role(String);

impl_validating_deserialize!(Role);

impl Role {
    /// Create a role, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty()
            || s.len() > 32
            || !s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidRole(s));
        }
        Ok(Self(s))
    }

    /// Access the role string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Did
// ---------------------------------------------------------------------------

/// A decentralized identifier: `did:sigil:<role>:<address>`.
///
/// Deterministically derived from a role and an on-chain address. Two
/// distinct addresses can never collide to the same DID, and parsing a
/// DID string recovers both components exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Construct the DID for a role and address.
    pub fn for_address(role: &Role, address: &Address) -> Self {
        Self(format!("did:{DID_METHOD}:{role}:{address}"))
    }

    /// Parse and validate a DID string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] unless the string is
    /// `did:sigil:<role>:<address>` with a valid role and a well-formed
    /// 20-byte address.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::parse_parts(&s)?;
        Ok(Self(s))
    }

    fn parse_parts(s: &str) -> Result<(Role, Address), ValidationError> {
        let mut parts = s.splitn(4, ':');
        let (scheme, method, role, address) = (
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        );
        if scheme != "did" || method != DID_METHOD {
            return Err(ValidationError::InvalidDid(s.to_string()));
        }
        let role = Role::new(role).map_err(|_| ValidationError::InvalidDid(s.to_string()))?;
        let address =
            Address::new(address).map_err(|_| ValidationError::InvalidDid(s.to_string()))?;
        Ok((role, address))
    }

    /// Access the DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The role segment.
    pub fn role(&self) -> Role {
        Self::parse_parts(&self.0)
            .expect("validated at construction")
            .0
    }

    /// The account address the DID is bound to.
    pub fn address(&self) -> Address {
        Self::parse_parts(&self.0)
            .expect("validated at construction")
            .1
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// CredentialId
// ---------------------------------------------------------------------------

/// A caller-supplied, globally-unique credential identifier.
///
/// Uniqueness is the caller's responsibility; this type only enforces that
/// the identifier is usable on the wire: non-empty, printable ASCII
/// without whitespace, at most 128 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CredentialId(String);

impl_validating_deserialize!(CredentialId);

impl CredentialId {
    /// Create a credential id, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.len() > 128 || !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::InvalidCredentialId(s));
        }
        Ok(Self(s))
    }

    /// Access the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
