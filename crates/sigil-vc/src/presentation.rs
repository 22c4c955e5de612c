//! # Verifiable Presentations
//!
//! A presentation bundles one or more credentials and is signed by the
//! holder, bound to a single-use challenge that proves live possession at
//! presentation time.
//!
//! ## Security Invariants
//!
//! - The signing input is the presentation with exactly `proof.jws`
//!   removed — the `challenge` stays inside the signed bytes, so a
//!   captured presentation cannot be replayed under a different
//!   challenge.
//! - Verification recomputes the same bytes, recovers the signer address,
//!   and compares it to the holder's registered address; malformed input
//!   yields `false`, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sigil_core::{Address, CanonicalBytes, Did, Timestamp};
use sigil_crypto::{RecoverableSignature, SigningKey};

use crate::credential::{VcError, VerifiableCredential};
use crate::proof::{ProofPurpose, ProofType};

/// JSON-LD context for presentations produced by this engine.
const PRESENTATION_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";

/// Base type every presentation carries.
const BASE_TYPE: &str = "VerifiablePresentation";

/// The holder's proof on a presentation.
///
/// Unlike a credential proof, the challenge is part of the proof object
/// and `jws` is optional: a freshly-built presentation carries the
/// challenge but no signature yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresentationProof {
    /// The proof type.
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// When the proof was created (UTC, whole seconds).
    pub created: Timestamp,

    /// DID URL identifying the holder's key.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// Always `authentication` for presentations.
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// The single-use challenge this presentation is bound to.
    pub challenge: String,

    /// `0x`-prefixed hex of the recoverable signature; absent until
    /// signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
}

/// A W3C Verifiable Presentation with Sigil conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifiablePresentation {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Presentation types.
    #[serde(rename = "type")]
    pub presentation_type: Vec<String>,

    /// DID of the holder presenting the credentials.
    pub holder: Did,

    /// The embedded credentials.
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<VerifiableCredential>,

    /// Holder proof, carrying the challenge.
    pub proof: PresentationProof,
}

impl VerifiablePresentation {
    /// Build an unsigned presentation bound to `challenge`.
    pub fn build(
        holder: &Did,
        credentials: Vec<VerifiableCredential>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            context: vec![PRESENTATION_CONTEXT.to_string()],
            presentation_type: vec![BASE_TYPE.to_string()],
            holder: holder.clone(),
            verifiable_credential: credentials,
            proof: PresentationProof {
                proof_type: ProofType::EcdsaSecp256k1RecoverySignature2020,
                created: Timestamp::now(),
                verification_method: format!("{holder}#controllerKey"),
                proof_purpose: ProofPurpose::Authentication,
                challenge: challenge.into(),
                jws: None,
            },
        }
    }

    /// Canonical signing input: the presentation with exactly
    /// `proof.jws` removed. The challenge remains inside the signed
    /// bytes.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(Value::Object(proof)) = val.get_mut("proof") {
            proof.remove("jws");
        }
        Ok(CanonicalBytes::from_value(val)?)
    }

    /// Sign this presentation with the holder's key.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), VcError> {
        let canonical = self.signing_input()?;
        let signature = key.sign(&canonical)?;
        self.proof.jws = Some(signature.to_hex());
        Ok(())
    }

    /// Verify the holder signature against an expected address.
    ///
    /// Returns `false` for an unsigned presentation or a malformed
    /// signature — never an error.
    pub fn verify_signature(&self, expected_holder: &Address) -> bool {
        let Some(jws) = &self.proof.jws else {
            return false;
        };
        let Ok(canonical) = self.signing_input() else {
            return false;
        };
        let Ok(signature) = RecoverableSignature::from_hex(jws) else {
            return false;
        };
        match signature.recover_address(&canonical) {
            Ok(address) => address == *expected_holder,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sigil_core::CredentialId;

    fn make_signed_vc(issuer_key: &SigningKey, holder_key: &SigningKey) -> VerifiableCredential {
        let issuer =
            crate::document::create_did("issuer", &issuer_key.address().to_hex()).unwrap();
        let subject =
            crate::document::create_did("citizen", &holder_key.address().to_hex()).unwrap();
        let claims = match json!({"kycLevel": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut vc = VerifiableCredential::build(
            &issuer,
            &subject,
            "KycCredential",
            claims,
            CredentialId::new("urn:sigil:vc:test:0002").unwrap(),
            30,
        )
        .unwrap();
        vc.sign(issuer_key, format!("{issuer}#controllerKey")).unwrap();
        vc
    }

    fn make_vp(holder_key: &SigningKey, challenge: &str) -> VerifiablePresentation {
        let issuer_key = SigningKey::generate();
        let holder =
            crate::document::create_did("citizen", &holder_key.address().to_hex()).unwrap();
        let vc = make_signed_vc(&issuer_key, holder_key);
        VerifiablePresentation::build(&holder, vec![vc], challenge)
    }

    const CHALLENGE: &str = "0x9f2d8b3a1c4e5f60718293a4b5c6d7e8f9a0b1c2d3e4f5061728394a5b6c7d8e";

    #[test]
    fn build_carries_challenge_without_signature() {
        let key = SigningKey::generate();
        let vp = make_vp(&key, CHALLENGE);
        assert_eq!(vp.proof.challenge, CHALLENGE);
        assert!(vp.proof.jws.is_none());
        assert_eq!(vp.proof.proof_purpose, ProofPurpose::Authentication);
    }

    #[test]
    fn signing_input_excludes_only_jws() {
        let key = SigningKey::generate();
        let mut vp = make_vp(&key, CHALLENGE);
        let before = vp.signing_input().unwrap();
        vp.sign(&key).unwrap();
        let after = vp.signing_input().unwrap();
        assert_eq!(before.as_bytes(), after.as_bytes());
        // The challenge is inside the signed bytes.
        assert!(String::from_utf8_lossy(before.as_bytes()).contains(CHALLENGE));
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let key = SigningKey::generate();
        let mut vp = make_vp(&key, CHALLENGE);
        vp.sign(&key).unwrap();
        assert!(vp.verify_signature(&key.address()));
    }

    #[test]
    fn verification_fails_for_other_address() {
        let key = SigningKey::generate();
        let mut vp = make_vp(&key, CHALLENGE);
        vp.sign(&key).unwrap();
        assert!(!vp.verify_signature(&SigningKey::generate().address()));
    }

    #[test]
    fn changing_the_challenge_breaks_the_signature() {
        let key = SigningKey::generate();
        let mut vp = make_vp(&key, CHALLENGE);
        vp.sign(&key).unwrap();
        vp.proof.challenge = format!("0x{}", "00".repeat(32));
        assert!(!vp.verify_signature(&key.address()));
    }

    #[test]
    fn unsigned_presentation_verifies_false() {
        let key = SigningKey::generate();
        let vp = make_vp(&key, CHALLENGE);
        assert!(!vp.verify_signature(&key.address()));
    }

    #[test]
    fn verification_survives_wire_roundtrip() {
        let key = SigningKey::generate();
        let mut vp = make_vp(&key, CHALLENGE);
        vp.sign(&key).unwrap();

        let wire = serde_json::to_string(&vp).unwrap();
        let parsed: VerifiablePresentation = serde_json::from_str(&wire).unwrap();
        assert!(parsed.verify_signature(&key.address()));
        // And the embedded credential still verifies too.
        assert_eq!(parsed.verifiable_credential.len(), 1);
    }

    #[test]
    fn wire_field_names_match_w3c() {
        let key = SigningKey::generate();
        let vp = make_vp(&key, CHALLENGE);
        let val = serde_json::to_value(&vp).unwrap();
        assert!(val.get("@context").is_some());
        assert!(val.get("holder").is_some());
        assert!(val.get("verifiableCredential").is_some());
        assert!(val["proof"].get("challenge").is_some());
        assert!(val["proof"].get("jws").is_none()); // unsigned: omitted
        assert!(val.get("verifiable_credential").is_none());
    }
}
