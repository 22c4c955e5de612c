//! # Recoverable secp256k1 ECDSA
//!
//! Implements the signature scheme the wire contract fixes: a recoverable
//! ECDSA signature over `keccak256(prefix || canonical-bytes)`, where the
//! prefix is the standard Ethereum personal-message domain separator.
//! Verifiers recover the signer's account address from the signature
//! itself and compare it to the address registered on chain for the DID.
//!
//! ## Wire format
//!
//! Signatures serialize as `0x` + 130 hex characters: 32 bytes `r`,
//! 32 bytes `s`, one byte `v` where `v = 27 + recovery_id`. This matches
//! the output of every mainstream wallet's `signMessage`, so signatures
//! produced here verify elsewhere and vice versa.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rand::rngs::OsRng;

use sigil_core::{keccak256, Address, CanonicalBytes};

use crate::error::CryptoError;

/// Fixed domain-separation prefix for personal-message signing.
const PERSONAL_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Compute the personal-message digest of a canonical payload.
///
/// `keccak256(prefix || len(message) || message)` — the same digest every
/// compliant signer and verifier computes for these bytes.
pub fn personal_digest(message: &CanonicalBytes) -> [u8; 32] {
    let mut input = Vec::with_capacity(PERSONAL_PREFIX.len() + 20 + message.len());
    input.extend_from_slice(PERSONAL_PREFIX.as_bytes());
    input.extend_from_slice(message.len().to_string().as_bytes());
    input.extend_from_slice(message.as_bytes());
    keccak256(&input)
}

/// A secp256k1 signing key bound to an account address.
///
/// The inner key material is zeroized on drop (by the underlying
/// implementation) and never appears in `Debug` output.
#[derive(Clone)]
pub struct SigningKey(k256::ecdsa::SigningKey);

impl SigningKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self(k256::ecdsa::SigningKey::random(&mut OsRng))
    }

    /// Construct from a 32-byte private scalar.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPrivateKey`] if the bytes are not a
    /// valid non-zero scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        k256::ecdsa::SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
    }

    /// The account address derived from this key's public key:
    /// the last 20 bytes of `keccak256(uncompressed_pubkey)`.
    pub fn address(&self) -> Address {
        address_of(self.0.verifying_key())
    }

    /// Sign the personal-message digest of a canonical payload.
    pub fn sign(&self, message: &CanonicalBytes) -> Result<RecoverableSignature, CryptoError> {
        let digest = personal_digest(message);
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key", &"[REDACTED]")
            .field("address", &self.address())
            .finish()
    }
}

/// A 65-byte recoverable ECDSA signature (`r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; 65]);

impl RecoverableSignature {
    /// Wrap raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] unless exactly
    /// 65 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse from `0x`-prefixed (or bare) hex.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(body).map_err(|e| CryptoError::HexDecode(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// `0x`-prefixed lowercase hex (130 characters after the prefix).
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The raw `r || s || v` bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Recover the signer's account address for a canonical payload.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RecoveryFailed`] if the signature is not
    /// valid for any key, or the recovery byte is out of range.
    pub fn recover_address(&self, message: &CanonicalBytes) -> Result<Address, CryptoError> {
        let digest = personal_digest(message);
        let signature = Signature::from_slice(&self.0[..64])
            .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

        // Accept both the Ethereum convention (27/28) and a raw id (0/1).
        let v = self.0[64];
        let id_byte = if v >= 27 { v - 27 } else { v };
        let recovery_id = RecoveryId::from_byte(id_byte)
            .ok_or_else(|| CryptoError::RecoveryFailed(format!("recovery byte {v} out of range")))?;

        let verifying_key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
            .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
        Ok(address_of(&verifying_key))
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl std::fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Account address of a verifying key: last 20 bytes of
/// `keccak256(uncompressed point without the 0x04 tag)`.
fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> CanonicalBytes {
        CanonicalBytes::from_value(json!({"claim": "over 18", "holder": "alice"})).unwrap()
    }

    #[test]
    fn known_key_derives_known_address() {
        // The address of private key 0x…01 is a standard test vector.
        let mut key_bytes = [0u8; 32];
        key_bytes[31] = 1;
        let key = SigningKey::from_bytes(&key_bytes).unwrap();
        assert_eq!(
            key.address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn sign_then_recover_yields_signer_address() {
        let key = SigningKey::generate();
        let sig = key.sign(&payload()).unwrap();
        let recovered = sig.recover_address(&payload()).unwrap();
        assert_eq!(recovered, key.address());
    }

    #[test]
    fn different_message_recovers_different_address() {
        let key = SigningKey::generate();
        let sig = key.sign(&payload()).unwrap();
        let other = CanonicalBytes::from_value(json!({"claim": "tampered"})).unwrap();
        // Recovery over different bytes yields *some* address, but not the
        // signer's — that mismatch is what verification detects.
        match sig.recover_address(&other) {
            Ok(addr) => assert_ne!(addr, key.address()),
            Err(_) => {} // an invalid point is an equally sound rejection
        }
    }

    #[test]
    fn signature_hex_roundtrip() {
        let key = SigningKey::generate();
        let sig = key.sign(&payload()).unwrap();
        let hex_form = sig.to_hex();
        assert_eq!(hex_form.len(), 132);
        let back = RecoverableSignature::from_hex(&hex_form).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn from_hex_rejects_malformed() {
        assert!(RecoverableSignature::from_hex("0x1234").is_err());
        assert!(RecoverableSignature::from_hex(&"zz".repeat(65)).is_err());
    }

    #[test]
    fn v_byte_follows_ethereum_convention() {
        let key = SigningKey::generate();
        let sig = key.sign(&payload()).unwrap();
        let v = sig.as_bytes()[64];
        assert!(v == 27 || v == 28, "unexpected v byte: {v}");
    }

    #[test]
    fn raw_recovery_byte_is_accepted() {
        let key = SigningKey::generate();
        let sig = key.sign(&payload()).unwrap();
        let mut raw = *sig.as_bytes();
        raw[64] -= 27;
        let alt = RecoverableSignature::from_bytes(&raw).unwrap();
        assert_eq!(alt.recover_address(&payload()).unwrap(), key.address());
    }

    #[test]
    fn personal_digest_matches_manual_construction() {
        let message = payload();
        let mut manual = Vec::new();
        manual.extend_from_slice(b"\x19Ethereum Signed Message:\n");
        manual.extend_from_slice(message.len().to_string().as_bytes());
        manual.extend_from_slice(message.as_bytes());
        assert_eq!(personal_digest(&message), sigil_core::keccak256(&manual));
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = SigningKey::generate();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn invalid_private_key_rejected() {
        assert!(SigningKey::from_bytes(&[0u8; 32]).is_err()); // zero scalar
        assert!(SigningKey::from_bytes(&[1u8; 16]).is_err()); // wrong length
    }
}
