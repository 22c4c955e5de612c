//! # Password vault
//!
//! Password-based authenticated encryption for the secrets behind a
//! wallet: the mnemonic that controls its key, and the serialized signed
//! credential that proves its holder's identity. A single password unlocks
//! both, which is what lets one printed voucher carry spending capability
//! and an identity credential together.
//!
//! ## Format
//!
//! `{ciphertext, iv, salt, authTag}` — each field base64. The key
//! derivation function and cipher are fixed constants of the format, not
//! negotiated per vault:
//!
//! - Argon2id (m = 19456 KiB, t = 2, p = 1) over a fresh 16-byte salt,
//!   producing a 256-bit key;
//! - AES-256-GCM with a fresh 12-byte IV, tag carried separately.
//!
//! ## Security Invariants
//!
//! - Decryption authenticates before releasing plaintext. A wrong password
//!   or any single mutated byte in any field fails with
//!   [`CryptoError::VaultAuthentication`] — never garbage output.
//! - Derived keys are zeroized on drop.
//! - Key derivation is deliberately slow; callers should keep it off
//!   latency-sensitive paths.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

const SALT_LEN: usize = 16;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

// Argon2id parameters — fixed constants of the vault format.
const ARGON2_M_COST: u32 = 19_456; // KiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// An encrypted container for one secret string.
///
/// All fields are base64-encoded byte strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vault {
    /// AES-256-GCM ciphertext (without the tag).
    pub ciphertext: String,
    /// 12-byte GCM initialization vector.
    pub iv: String,
    /// 16-byte Argon2id salt.
    pub salt: String,
    /// 16-byte GCM authentication tag.
    #[serde(rename = "authTag")]
    pub auth_tag: String,
}

/// Wrapper for the password-derived key that ensures zeroization.
#[derive(Zeroize, ZeroizeOnDrop)]
struct VaultKey([u8; ARGON2_OUTPUT_LEN]);

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").field("key", &"[REDACTED]").finish()
    }
}

/// Derive the vault key from a password and salt using Argon2id.
fn derive_vault_key(password: &str, salt: &[u8]) -> Result<VaultKey, CryptoError> {
    let params = Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(VaultKey(output))
}

/// Encrypt a secret under a password.
///
/// Generates a fresh salt and IV for every call; encrypting the same
/// secret twice yields unrelated vaults.
pub fn encrypt_vault(secret: &str, password: &str) -> Result<Vault, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let key = derive_vault_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let mut sealed = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: secret.as_bytes(),
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::VaultAuthentication)?;

    // AEAD output is ciphertext || tag; the wire format carries them apart.
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    Ok(Vault {
        ciphertext: BASE64.encode(&sealed),
        iv: BASE64.encode(iv),
        salt: BASE64.encode(salt),
        auth_tag: BASE64.encode(tag),
    })
}

/// Decrypt a vault with a password.
///
/// # Errors
///
/// - [`CryptoError::VaultFormat`] if a field is not valid base64 or has
///   the wrong length — the vault cannot even be parsed.
/// - [`CryptoError::VaultAuthentication`] if parsing succeeds but
///   authentication fails: wrong password, or any mutated byte in
///   ciphertext, IV, salt, or tag.
pub fn decrypt_vault(vault: &Vault, password: &str) -> Result<String, CryptoError> {
    let ciphertext = decode_field(&vault.ciphertext, "ciphertext", None)?;
    let iv = decode_field(&vault.iv, "iv", Some(IV_LEN))?;
    let salt = decode_field(&vault.salt, "salt", Some(SALT_LEN))?;
    let tag = decode_field(&vault.auth_tag, "authTag", Some(TAG_LEN))?;

    let key = derive_vault_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let mut sealed = ciphertext;
    sealed.extend_from_slice(&tag);

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &sealed,
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::VaultAuthentication)?;

    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::VaultFormat("plaintext is not UTF-8".to_string()))
}

fn decode_field(
    value: &str,
    name: &str,
    expected_len: Option<usize>,
) -> Result<Vec<u8>, CryptoError> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| CryptoError::VaultFormat(format!("{name}: {e}")))?;
    if let Some(len) = expected_len {
        if bytes.len() != len {
            return Err(CryptoError::VaultFormat(format!(
                "{name}: expected {len} bytes, got {}",
                bytes.len()
            )));
        }
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Voucher sealing
// ---------------------------------------------------------------------------

/// The two secrets a printed voucher carries, each in its own vault but
/// sealed under one password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherSecrets {
    /// Vault holding the wallet mnemonic.
    pub mnemonic: Vault,
    /// Vault holding the serialized signed credential.
    pub credential: Vault,
}

/// Seal a mnemonic and a serialized credential under one password.
pub fn seal_voucher(
    mnemonic: &str,
    credential_json: &str,
    password: &str,
) -> Result<VoucherSecrets, CryptoError> {
    Ok(VoucherSecrets {
        mnemonic: encrypt_vault(mnemonic, password)?,
        credential: encrypt_vault(credential_json, password)?,
    })
}

/// Open a voucher, returning `(mnemonic, credential_json)`.
pub fn open_voucher(
    voucher: &VoucherSecrets,
    password: &str,
) -> Result<(String, String), CryptoError> {
    let mnemonic = decrypt_vault(&voucher.mnemonic, password)?;
    let credential = decrypt_vault(&voucher.credential, password)?;
    Ok((mnemonic, credential))
}
