//! # Proof types
//!
//! The cryptographic proof structure attached to credentials. The proof
//! object is rigid — no extension fields — so unexpected members cannot
//! ride along inside signed payloads.

use serde::{Deserialize, Serialize};

use sigil_core::Timestamp;

/// The type of cryptographic proof attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// Recoverable secp256k1 ECDSA over a personal-message keccak digest.
    EcdsaSecp256k1RecoverySignature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::EcdsaSecp256k1RecoverySignature2020 => {
                write!(f, "EcdsaSecp256k1RecoverySignature2020")
            }
        }
    }
}

/// The purpose of a cryptographic proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims are true.
    AssertionMethod,
    /// Authentication of the credential holder.
    Authentication,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofPurpose::AssertionMethod => write!(f, "assertionMethod"),
            ProofPurpose::Authentication => write!(f, "authentication"),
        }
    }
}

/// A credential proof.
///
/// The `jws` member carries the hex-encoded 65-byte recoverable signature
/// computed over the personal-message digest of the credential's canonical
/// bytes (with the `proof` member excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Proof {
    /// The proof type.
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// When the proof was created (UTC, whole seconds).
    pub created: Timestamp,

    /// DID URL identifying the signing key.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// The purpose of this proof.
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// `0x`-prefixed hex of the recoverable signature.
    pub jws: String,
}

impl Proof {
    /// Create an assertion proof with the current timestamp.
    pub fn new_assertion(verification_method: String, jws: String) -> Self {
        Self {
            proof_type: ProofType::EcdsaSecp256k1RecoverySignature2020,
            created: Timestamp::now(),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            jws,
        }
    }
}
