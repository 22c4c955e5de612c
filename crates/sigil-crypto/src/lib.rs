//! # sigil-crypto — Cryptographic Primitives for the Sigil Trust Engine
//!
//! This crate provides the two cryptographic capabilities the trust engine
//! is built on:
//!
//! - **Recoverable secp256k1 ECDSA** over Ethereum personal-message
//!   digests ([`ecdsa`]). Signatures carry a recovery id, so verifiers
//!   recover the signer's account address directly from the signature —
//!   no separate public-key field travels on the wire.
//! - **Password vault** ([`vault`]): Argon2id key derivation plus
//!   AES-256-GCM authenticated encryption for wallet mnemonics and
//!   serialized signed credentials.
//!
//! ## Security Invariants
//!
//! - Signing functions accept [`CanonicalBytes`](sigil_core::CanonicalBytes)
//!   — never raw byte slices — so only canonicalized payloads can be
//!   signed or verified.
//! - Key material is zeroized on drop and redacted from `Debug` output.
//! - Vault decryption authenticates before releasing plaintext: a wrong
//!   password or a single flipped byte fails closed.

pub mod ecdsa;
pub mod error;
pub mod vault;

// Re-export primary types.
pub use ecdsa::{personal_digest, RecoverableSignature, SigningKey};
pub use error::CryptoError;
pub use vault::{decrypt_vault, encrypt_vault, open_voucher, seal_voucher, Vault, VoucherSecrets};
