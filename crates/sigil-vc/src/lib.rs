//! # sigil-vc — Verifiable Credentials for the Sigil Trust Engine
//!
//! Implements the W3C Verifiable Credentials data model over the
//! recoverable-signature scheme from `sigil-crypto`. Provides:
//!
//! - **DID documents** ([`DidDocument`]) binding a DID to an on-chain
//!   account via a chain-qualified account reference, with a byte-stable
//!   keccak hash used as the on-chain anchor.
//! - **Credentials** ([`VerifiableCredential`]): construction, signing,
//!   and signature verification against an expected issuer address.
//! - **Presentations** ([`VerifiablePresentation`]): challenge-bound
//!   bundles of credentials signed by the holder.
//!
//! ## Security Invariants
//!
//! - All proof computation canonicalizes through
//!   [`CanonicalBytes`](sigil_core::CanonicalBytes) — never raw
//!   `serde_json::to_vec()`.
//! - Credential signing strips exactly the `proof` member before
//!   canonicalization; presentation signing strips exactly `proof.jws`
//!   (the challenge stays inside the signed bytes). Issuer and verifier
//!   apply the identical exclusion.
//! - Verification predicates return `false` for absent or malformed
//!   proofs — they never panic and never error on semantic invalidity.

pub mod credential;
pub mod document;
pub mod presentation;
pub mod proof;

// Re-export primary types.
pub use credential::{VcError, VerifiableCredential};
pub use document::{create_did, DidDocument, VerificationMethod};
pub use presentation::{PresentationProof, VerifiablePresentation};
pub use proof::{Proof, ProofPurpose, ProofType};
