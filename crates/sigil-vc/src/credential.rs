//! # Verifiable Credential structure, signing, and verification
//!
//! Defines the [`VerifiableCredential`] envelope following the W3C VC
//! data model, adapted for Sigil conventions.
//!
//! ## Security Invariants
//!
//! - **Signing** canonicalizes the credential body with exactly the
//!   `proof` member removed — nothing else — computes the recoverable
//!   signature over its personal-message digest, and attaches a
//!   [`Proof`]. No raw `serde_json::to_vec()` is used anywhere in the
//!   signing path.
//! - **Verification** recomputes the identical canonical bytes, recovers
//!   the signer address from the signature, and compares it to the
//!   issuer's registered address. Absent or malformed proofs yield
//!   `false` — never a panic, never an error.
//! - The envelope is rigid; `credential_subject` is intentionally
//!   extensible per the W3C specification, except that its `id` member is
//!   always the subject DID and cannot be overridden by caller claims.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use sigil_core::{
    Address, CanonicalBytes, CanonicalizationError, CredentialId, Did, Timestamp, ValidationError,
};
use sigil_crypto::{CryptoError, RecoverableSignature, SigningKey};

use crate::proof::Proof;

/// JSON-LD context for credentials produced by this engine.
const CREDENTIAL_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";

/// Base type every credential carries.
const BASE_TYPE: &str = "VerifiableCredential";

/// Errors from credential construction and signing.
///
/// Verification predicates deliberately do not use this type: semantic
/// invalidity is a `false`, not an error.
#[derive(Error, Debug)]
pub enum VcError {
    /// Canonicalization of the credential body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A W3C Verifiable Credential with Sigil conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifiableCredential {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Globally-unique credential identifier, supplied by the caller.
    pub id: CredentialId,

    /// Credential types. Always includes `"VerifiableCredential"`.
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,

    /// DID of the issuer.
    pub issuer: Did,

    /// The credential subject: the subject DID under `id`, plus the
    /// issuer's claims.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: Value,

    /// Start of the validity window (inclusive).
    #[serde(rename = "validFrom")]
    pub valid_from: Timestamp,

    /// End of the validity window (inclusive).
    #[serde(rename = "validUntil")]
    pub valid_until: Timestamp,

    /// Issuer proof; absent until signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    /// Build an unsigned credential.
    ///
    /// Sets `validFrom` to now and `validUntil` to now plus
    /// `validity_days`. The `id` must be globally unique — a collision is
    /// a caller error, and nothing here will silently overwrite one
    /// credential with another.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyCredentialType`] for an empty type.
    /// - [`ValidationError::InvalidValidityDays`] for a window under one day.
    pub fn build(
        issuer: &Did,
        subject: &Did,
        credential_type: &str,
        claims: serde_json::Map<String, Value>,
        vc_id: CredentialId,
        validity_days: i64,
    ) -> Result<Self, ValidationError> {
        if credential_type.is_empty() {
            return Err(ValidationError::EmptyCredentialType);
        }
        if validity_days < 1 {
            return Err(ValidationError::InvalidValidityDays(validity_days));
        }

        let mut subject_map = claims;
        // Inserted last: a caller claim named "id" cannot displace the
        // subject binding.
        subject_map.insert("id".to_string(), Value::String(subject.as_str().to_string()));

        let now = Timestamp::now();
        Ok(Self {
            context: vec![CREDENTIAL_CONTEXT.to_string()],
            id: vc_id,
            credential_type: vec![BASE_TYPE.to_string(), credential_type.to_string()],
            issuer: issuer.clone(),
            credential_subject: Value::Object(subject_map),
            valid_from: now,
            valid_until: now.plus_days(validity_days),
            proof: None,
        })
    }

    /// Canonical signing input: the credential with exactly the `proof`
    /// member removed.
    ///
    /// This is the only exclusion, and it is applied identically by
    /// issuer and verifier.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(obj) = val.as_object_mut() {
            obj.remove("proof");
        }
        Ok(CanonicalBytes::from_value(val)?)
    }

    /// Sign this credential with the issuer's key.
    ///
    /// Attaches an assertion [`Proof`] whose `jws` is the hex-encoded
    /// recoverable signature over the signing input.
    pub fn sign(
        &mut self,
        key: &SigningKey,
        verification_method: impl Into<String>,
    ) -> Result<(), VcError> {
        let canonical = self.signing_input()?;
        let signature = key.sign(&canonical)?;
        self.proof = Some(Proof::new_assertion(
            verification_method.into(),
            signature.to_hex(),
        ));
        Ok(())
    }

    /// Verify the issuer signature against an expected address.
    ///
    /// Recomputes the canonical signing input, recovers the signer
    /// address from `proof.jws`, and compares. Address comparison is
    /// case-insensitive by construction (addresses are raw bytes).
    /// Returns `false` for missing or malformed proofs.
    pub fn verify_signature(&self, expected_issuer: &Address) -> bool {
        let Some(proof) = &self.proof else {
            return false;
        };
        let Ok(canonical) = self.signing_input() else {
            return false;
        };
        let Ok(signature) = RecoverableSignature::from_hex(&proof.jws) else {
            return false;
        };
        match signature.recover_address(&canonical) {
            Ok(address) => address == *expected_issuer,
            Err(_) => false,
        }
    }

    /// The subject DID, if `credentialSubject.id` is well-formed.
    pub fn subject_id(&self) -> Option<Did> {
        let id = self.credential_subject.get("id")?.as_str()?;
        Did::new(id).ok()
    }

    /// Whether `at` lies inside the validity window, inclusive on both
    /// ends.
    pub fn is_valid_at(&self, at: &Timestamp) -> bool {
        *at >= self.valid_from && *at <= self.valid_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issuer_key() -> SigningKey {
        SigningKey::generate()
    }

    fn make_vc(issuer_key: &SigningKey) -> VerifiableCredential {
        let issuer = create_test_did("issuer", issuer_key);
        let holder_key = SigningKey::generate();
        let subject = create_test_did("citizen", &holder_key);
        let claims = match json!({"fullName": "Amina Diallo", "kycLevel": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        VerifiableCredential::build(
            &issuer,
            &subject,
            "KycCredential",
            claims,
            CredentialId::new("urn:sigil:vc:test:0001").unwrap(),
            365,
        )
        .unwrap()
    }

    fn create_test_did(role: &str, key: &SigningKey) -> Did {
        crate::document::create_did(role, &key.address().to_hex()).unwrap()
    }

    #[test]
    fn build_sets_validity_window() {
        let key = issuer_key();
        let vc = make_vc(&key);
        assert_eq!(vc.valid_until, vc.valid_from.plus_days(365));
        assert!(vc.proof.is_none());
        assert_eq!(vc.credential_type, vec!["VerifiableCredential", "KycCredential"]);
    }

    #[test]
    fn build_rejects_bad_input() {
        let key = issuer_key();
        let issuer = create_test_did("issuer", &key);
        let subject = create_test_did("citizen", &key);
        let id = CredentialId::new("urn:x").unwrap();
        assert!(matches!(
            VerifiableCredential::build(&issuer, &subject, "", Default::default(), id.clone(), 1),
            Err(ValidationError::EmptyCredentialType)
        ));
        assert!(matches!(
            VerifiableCredential::build(&issuer, &subject, "T", Default::default(), id, 0),
            Err(ValidationError::InvalidValidityDays(0))
        ));
    }

    #[test]
    fn claims_cannot_override_subject_binding() {
        let key = issuer_key();
        let issuer = create_test_did("issuer", &key);
        let subject = create_test_did("citizen", &key);
        let claims = match json!({"id": "did:sigil:citizen:0x0000000000000000000000000000000000000009"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let vc = VerifiableCredential::build(
            &issuer,
            &subject,
            "T",
            claims,
            CredentialId::new("urn:x").unwrap(),
            1,
        )
        .unwrap();
        assert_eq!(vc.subject_id().unwrap(), subject);
    }

    #[test]
    fn signing_input_excludes_only_proof() {
        let key = issuer_key();
        let mut vc = make_vc(&key);
        let before = vc.signing_input().unwrap();
        vc.sign(&key, format!("{}#controllerKey", vc.issuer)).unwrap();
        let after = vc.signing_input().unwrap();
        assert_eq!(before.as_bytes(), after.as_bytes());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let key = issuer_key();
        let mut vc = make_vc(&key);
        vc.sign(&key, format!("{}#controllerKey", vc.issuer)).unwrap();
        assert!(vc.verify_signature(&key.address()));
    }

    #[test]
    fn verification_fails_for_other_address() {
        let key = issuer_key();
        let mut vc = make_vc(&key);
        vc.sign(&key, format!("{}#controllerKey", vc.issuer)).unwrap();
        let other = SigningKey::generate();
        assert!(!vc.verify_signature(&other.address()));
    }

    #[test]
    fn verification_fails_after_claim_tamper() {
        let key = issuer_key();
        let mut vc = make_vc(&key);
        vc.sign(&key, format!("{}#controllerKey", vc.issuer)).unwrap();
        vc.credential_subject["kycLevel"] = json!(3);
        assert!(!vc.verify_signature(&key.address()));
    }

    #[test]
    fn unsigned_or_malformed_proof_is_false_not_error() {
        let key = issuer_key();
        let vc = make_vc(&key);
        assert!(!vc.verify_signature(&key.address()));

        let mut signed = make_vc(&key);
        signed.sign(&key, "vm").unwrap();
        signed.proof.as_mut().unwrap().jws = "0xnothex".to_string();
        assert!(!signed.verify_signature(&key.address()));
    }

    #[test]
    fn verification_survives_wire_roundtrip() {
        let key = issuer_key();
        let mut vc = make_vc(&key);
        vc.sign(&key, format!("{}#controllerKey", vc.issuer)).unwrap();

        let wire = serde_json::to_string(&vc).unwrap();
        let parsed: VerifiableCredential = serde_json::from_str(&wire).unwrap();
        assert!(parsed.verify_signature(&key.address()));
    }

    #[test]
    fn validity_window_is_inclusive_on_both_ends() {
        let key = issuer_key();
        let vc = make_vc(&key);
        assert!(vc.is_valid_at(&vc.valid_from));
        assert!(vc.is_valid_at(&vc.valid_until));
        assert!(!vc.is_valid_at(&vc.valid_until.plus_seconds(1)));
        let before = vc.valid_from.plus_seconds(-1);
        assert!(!vc.is_valid_at(&before));
    }

    #[test]
    fn wire_field_names_match_w3c() {
        let key = issuer_key();
        let vc = make_vc(&key);
        let val = serde_json::to_value(&vc).unwrap();
        assert!(val.get("@context").is_some());
        assert!(val.get("type").is_some());
        assert!(val.get("credentialSubject").is_some());
        assert!(val.get("validFrom").is_some());
        assert!(val.get("validUntil").is_some());
        assert!(val.get("credential_subject").is_none());
        assert!(val.get("proof").is_none()); // unsigned: omitted entirely
    }
}
