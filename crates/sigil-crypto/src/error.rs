//! # Cryptographic error types
//!
//! Structured errors for all cryptographic operations in `sigil-crypto`.
//! Uses `thiserror` for ergonomic error definitions with diagnostic context.

use thiserror::Error;

/// Errors from cryptographic operations in the Sigil trust engine.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A private key could not be constructed from the given bytes.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A signature had the wrong length.
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// Signing failed (should not happen with a valid key).
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The signer address could not be recovered from a signature.
    #[error("address recovery failed: {0}")]
    RecoveryFailed(String),

    /// Password key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A vault field was not decodable or had the wrong length.
    #[error("malformed vault: {0}")]
    VaultFormat(String),

    /// Vault authentication failed: wrong password or tampered data.
    #[error("vault authentication failed: wrong password or corrupted data")]
    VaultAuthentication,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_length_display() {
        let err = CryptoError::InvalidSignatureLength(64);
        let msg = format!("{err}");
        assert!(msg.contains("65 bytes"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn vault_authentication_display() {
        let err = CryptoError::VaultAuthentication;
        assert!(format!("{err}").contains("wrong password"));
    }
}
