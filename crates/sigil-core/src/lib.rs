//! # sigil-core — Foundational Types for the Sigil Trust Engine
//!
//! This crate provides the building blocks shared by every other crate in
//! the workspace:
//!
//! - **Canonical serialization** ([`CanonicalBytes`]) — the single
//!   deterministic byte encoding consumed by every signing, verification,
//!   and hashing path.
//! - **Keccak-256 digests** ([`ContentDigest`], [`keccak256_digest`]) —
//!   the on-chain-compatible content hash over canonical bytes.
//! - **Identity newtypes** ([`Did`], [`Address`], [`Role`],
//!   [`CredentialId`]) — validated at construction, so malformed
//!   identifiers cannot circulate.
//! - **Timestamps** ([`Timestamp`]) — UTC, truncated to whole seconds,
//!   with a fixed wire format.
//! - **Structured errors** ([`ValidationError`], [`CanonicalizationError`]).
//!
//! ## Security Invariants
//!
//! - Every digest and every signature in the workspace is computed over
//!   [`CanonicalBytes`] — never over raw `serde_json::to_vec()` output.
//!   The type signatures of the digest and signing functions enforce this.
//! - Identifier newtypes validate on construction *and* on deserialization,
//!   so a malformed DID or address is rejected at the boundary rather than
//!   discovered mid-verification.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod time;

// Re-export primary types.
pub use canonical::{CanonicalBytes, CanonicalizationError};
pub use digest::{keccak256, keccak256_digest, ContentDigest};
pub use error::ValidationError;
pub use identity::{Address, CredentialId, Did, Role, DID_METHOD};
pub use time::Timestamp;
