//! # DID documents
//!
//! Constructs and hashes the documents that bind a DID to its on-chain
//! account. The verification method embeds a chain-qualified account
//! reference (`eip155:<chain>:<address>`), so any compliant verifier can
//! recover the address from the document alone — no out-of-band knowledge.
//!
//! The document's keccak hash over canonical bytes serves as the on-chain
//! anchor and as an integrity check when documents are cached off chain.

use serde::{Deserialize, Serialize};

use sigil_core::{
    keccak256_digest, Address, CanonicalBytes, CanonicalizationError, ContentDigest, Did, Role,
    Timestamp, ValidationError,
};

/// Chain qualifier baked into every account reference this engine emits.
const ACCOUNT_CHAIN: &str = "eip155:1";

/// Verification-method type for recoverable secp256k1 keys.
const VERIFICATION_METHOD_TYPE: &str = "EcdsaSecp256k1RecoveryMethod2020";

/// Derive the DID for a role and address.
///
/// Pure, deterministic string construction; distinct addresses never
/// collide and the mapping inverts by parsing.
///
/// # Errors
///
/// Returns [`ValidationError`] if the role or address is malformed.
pub fn create_did(role: &str, address: &str) -> Result<Did, ValidationError> {
    let role = Role::new(role)?;
    let address = Address::new(address)?;
    Ok(Did::for_address(&role, &address))
}

/// A verification method binding a DID to an account address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationMethod {
    /// DID URL of this key entry.
    pub id: String,

    /// The verification-method type.
    #[serde(rename = "type")]
    pub method_type: String,

    /// DID in control of this key.
    pub controller: Did,

    /// Hex-encoded public key.
    #[serde(rename = "publicKeyHex")]
    pub public_key_hex: String,

    /// Chain-qualified account reference (`eip155:<chain>:<address>`).
    #[serde(rename = "blockchainAccountId")]
    pub blockchain_account_id: String,
}

/// A DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DidDocument {
    /// The DID this document describes.
    pub id: Did,

    /// The controlling DID (the subject itself unless delegated).
    pub controller: Did,

    /// Key material bound to this DID.
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,

    /// When the document was first created.
    pub created: Timestamp,

    /// When the document was last updated.
    pub updated: Timestamp,
}

impl DidDocument {
    /// Build a document binding `did` to `address`.
    ///
    /// `controller` defaults to the DID itself.
    pub fn new(
        did: Did,
        address: &Address,
        public_key_hex: impl Into<String>,
        controller: Option<Did>,
    ) -> Self {
        let now = Timestamp::now();
        let verification_method = VerificationMethod {
            id: format!("{did}#controllerKey"),
            method_type: VERIFICATION_METHOD_TYPE.to_string(),
            controller: controller.clone().unwrap_or_else(|| did.clone()),
            public_key_hex: public_key_hex.into(),
            blockchain_account_id: format!("{ACCOUNT_CHAIN}:{address}"),
        };
        Self {
            controller: controller.unwrap_or_else(|| did.clone()),
            id: did,
            verification_method: vec![verification_method],
            created: now,
            updated: now,
        }
    }

    /// Keccak-256 hash of the document's canonical bytes.
    ///
    /// Byte-stable regardless of in-memory key ordering — this is the
    /// value anchored on chain.
    pub fn hash(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(keccak256_digest(&CanonicalBytes::new(self)?))
    }

    /// Extract the account address bound by the first verification method.
    ///
    /// Returns `None` — never an error — when the document carries no
    /// verification method or the account reference is malformed, so
    /// callers can fail a verification check gracefully.
    pub fn extract_address(&self) -> Option<Address> {
        let account_id = &self.verification_method.first()?.blockchain_account_id;
        let address_part = account_id.rsplit(':').next()?;
        Address::new(address_part).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xb9c5714089478a327f09197987f16f9e5d936e8a";

    fn document() -> DidDocument {
        let did = create_did("citizen", ADDR).unwrap();
        DidDocument::new(did, &Address::new(ADDR).unwrap(), "04deadbeef", None)
    }

    #[test]
    fn create_did_builds_expected_string() {
        let did = create_did("citizen", ADDR).unwrap();
        assert_eq!(did.as_str(), format!("did:sigil:citizen:{ADDR}"));
    }

    #[test]
    fn create_did_rejects_bad_address() {
        assert!(matches!(
            create_did("citizen", "0x1234"),
            Err(ValidationError::InvalidAddress(_))
        ));
        assert!(create_did("Citizen", ADDR).is_err());
    }

    #[test]
    fn controller_defaults_to_did() {
        let doc = document();
        assert_eq!(doc.controller, doc.id);
        assert_eq!(doc.verification_method[0].controller, doc.id);
    }

    #[test]
    fn explicit_controller_is_kept() {
        let did = create_did("citizen", ADDR).unwrap();
        let controller = create_did("issuer", "0x0000000000000000000000000000000000000002").unwrap();
        let doc = DidDocument::new(
            did.clone(),
            &Address::new(ADDR).unwrap(),
            "04beef",
            Some(controller.clone()),
        );
        assert_eq!(doc.id, did);
        assert_eq!(doc.controller, controller);
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let doc = document();
        assert_eq!(doc.hash().unwrap(), doc.hash().unwrap());
    }

    #[test]
    fn hash_is_independent_of_json_key_order() {
        let doc = document();
        // Round-trip through differently-ordered JSON and re-hash.
        let val = serde_json::to_value(&doc).unwrap();
        let reordered = format!(
            r#"{{"updated":{},"created":{},"verificationMethod":{},"controller":{},"id":{}}}"#,
            val["updated"], val["created"], val["verificationMethod"], val["controller"], val["id"],
        );
        let reparsed: DidDocument = serde_json::from_str(&reordered).unwrap();
        assert_eq!(reparsed.hash().unwrap(), doc.hash().unwrap());
    }

    #[test]
    fn hash_changes_when_content_changes() {
        let doc = document();
        let mut other = doc.clone();
        other.verification_method[0].public_key_hex = "04cafe".to_string();
        assert_ne!(doc.hash().unwrap(), other.hash().unwrap());
    }

    #[test]
    fn extract_address_recovers_binding() {
        let doc = document();
        assert_eq!(doc.extract_address().unwrap().to_hex(), ADDR);
    }

    #[test]
    fn extract_address_is_none_for_malformed_documents() {
        let mut doc = document();
        doc.verification_method[0].blockchain_account_id = "eip155:1:not-an-address".to_string();
        assert!(doc.extract_address().is_none());

        doc.verification_method.clear();
        assert!(doc.extract_address().is_none());
    }

    #[test]
    fn wire_field_names_match_w3c() {
        let val = serde_json::to_value(document()).unwrap();
        assert!(val.get("verificationMethod").is_some());
        assert!(val.get("verification_method").is_none());
        let vm = &val["verificationMethod"][0];
        assert!(vm.get("publicKeyHex").is_some());
        assert!(vm.get("blockchainAccountId").is_some());
        assert_eq!(vm["type"], "EcdsaSecp256k1RecoveryMethod2020");
    }
}
