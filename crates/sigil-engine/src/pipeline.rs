//! # Verification pipeline
//!
//! The ordered, short-circuiting check sequence a presented credential
//! must clear. Cheap, local checks run before anything that touches an
//! external resource:
//!
//! 1. structural validity,
//! 2. challenge consumption and binding,
//! 3. holder signature,
//! 4. issuer signature,
//! 5. validity window (inclusive on both ends),
//! 6. registry status,
//! 7. subject binding.
//!
//! Every run produces a single [`VerificationReport`], even on failure:
//! the first unmet check stops evaluation, but the booleans for the
//! checks already passed stay in the record for auditability. The report
//! is strictly binary — `checks` exists for diagnostics, never to soften
//! the pass/fail contract.
//!
//! Semantically invalid input never raises an error; resolver and
//! registry failures (including timeouts) fail the check they were
//! serving. There is no "assume valid" path.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use subtle::ConstantTimeEq;

use sigil_core::{Address, Did, Timestamp};
use sigil_vc::VerifiablePresentation;

use crate::challenge::{ChallengeError, ChallengeService, ChallengeState};
use crate::resolver::{CredentialStatus, CredentialStatusRegistry, DidResolver};
use crate::store::{ExpiringStore, MemoryStore};

/// Outcome booleans for each evaluated check.
///
/// A field is `None` when evaluation stopped before reaching it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChecks {
    /// Required fields present on the VP and its embedded credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<bool>,
    /// Challenge known, live, unused, and bound to this presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<bool>,
    /// Holder signature verifies against the holder's registered address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_signature: Option<bool>,
    /// Issuer signature verifies against the issuer's registered address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_signature: Option<bool>,
    /// The current time lies inside the credential's validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_window: Option<bool>,
    /// The status registry reports the credential ACTIVE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<bool>,
    /// The credential was issued to the presenting holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_binding: Option<bool>,
}

/// The structured outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// The binary verdict.
    pub valid: bool,
    /// Human-readable cause of the first failed check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Audit record of evaluated checks.
    pub checks: VerificationChecks,
    /// The verified subject claims; populated only on full success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<Value>,
}

impl VerificationReport {
    fn failure(checks: VerificationChecks, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::debug!(%reason, "presentation rejected");
        Self {
            valid: false,
            reason: Some(reason),
            checks,
            credential_subject: None,
        }
    }

    fn success(checks: VerificationChecks, credential_subject: Value) -> Self {
        Self {
            valid: true,
            reason: None,
            checks,
            credential_subject: Some(credential_subject),
        }
    }
}

/// Runs the ordered verification checks over a presented VP.
pub struct Verifier<S = MemoryStore<ChallengeState>> {
    resolver: Arc<dyn DidResolver>,
    registry: Arc<dyn CredentialStatusRegistry>,
    challenges: Arc<ChallengeService<S>>,
}

impl<S: ExpiringStore<ChallengeState>> Verifier<S> {
    /// Assemble a verifier from its collaborators.
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        registry: Arc<dyn CredentialStatusRegistry>,
        challenges: Arc<ChallengeService<S>>,
    ) -> Self {
        Self {
            resolver,
            registry,
            challenges,
        }
    }

    /// Run the full check sequence.
    ///
    /// `expected_challenge` is the challenge the surrounding flow bound
    /// this presentation to (the one carried by the session). On success
    /// the consumed challenge can never verify again.
    pub fn verify_presentation(
        &self,
        vp: &VerifiablePresentation,
        expected_challenge: &str,
    ) -> VerificationReport {
        let mut checks = VerificationChecks::default();

        // 1. Structural validity.
        if let Err(reason) = structural_check(vp) {
            checks.structure = Some(false);
            return VerificationReport::failure(checks, reason);
        }
        checks.structure = Some(true);

        // 2. Challenge: consume atomically, then confirm the binding.
        if let Err(e) = self.challenges.verify(&vp.proof.challenge) {
            checks.challenge = Some(false);
            let reason = match e {
                ChallengeError::NotFound => "challenge is unknown",
                ChallengeError::Expired => "challenge has expired",
                ChallengeError::Replayed => "challenge was already used",
            };
            return VerificationReport::failure(checks, reason);
        }
        let bound: bool = vp
            .proof
            .challenge
            .as_bytes()
            .ct_eq(expected_challenge.as_bytes())
            .into();
        if !bound {
            checks.challenge = Some(false);
            return VerificationReport::failure(
                checks,
                "presentation is bound to a different challenge",
            );
        }
        checks.challenge = Some(true);

        // 3. Holder signature.
        let holder_address = match self.registered_address(&vp.holder) {
            Ok(address) => address,
            Err(reason) => {
                checks.holder_signature = Some(false);
                return VerificationReport::failure(checks, format!("holder {reason}"));
            }
        };
        if !vp.verify_signature(&holder_address) {
            checks.holder_signature = Some(false);
            return VerificationReport::failure(checks, "holder signature does not verify");
        }
        checks.holder_signature = Some(true);

        // 4. Issuer signature, per embedded credential.
        for vc in &vp.verifiable_credential {
            let issuer_address = match self.registered_address(&vc.issuer) {
                Ok(address) => address,
                Err(reason) => {
                    checks.issuer_signature = Some(false);
                    return VerificationReport::failure(checks, format!("issuer {reason}"));
                }
            };
            if !vc.verify_signature(&issuer_address) {
                checks.issuer_signature = Some(false);
                return VerificationReport::failure(
                    checks,
                    format!("issuer signature on credential {} does not verify", vc.id),
                );
            }
        }
        checks.issuer_signature = Some(true);

        // 5. Validity window, inclusive on both ends.
        let now = Timestamp::now();
        for vc in &vp.verifiable_credential {
            if !vc.is_valid_at(&now) {
                checks.validity_window = Some(false);
                return VerificationReport::failure(
                    checks,
                    format!(
                        "credential {} is outside its validity window ({} to {})",
                        vc.id, vc.valid_from, vc.valid_until
                    ),
                );
            }
        }
        checks.validity_window = Some(true);

        // 6. Registry status. Revocation gets its own reason string;
        // every other non-active status shares one.
        for vc in &vp.verifiable_credential {
            let status = match self.registry.status(&vc.id) {
                Ok(status) => status,
                Err(e) => {
                    checks.credential_status = Some(false);
                    return VerificationReport::failure(
                        checks,
                        format!("status lookup for credential {} failed: {e}", vc.id),
                    );
                }
            };
            match status {
                CredentialStatus::Active => {}
                CredentialStatus::Revoked => {
                    checks.credential_status = Some(false);
                    return VerificationReport::failure(
                        checks,
                        format!("credential {} has been revoked", vc.id),
                    );
                }
                other => {
                    checks.credential_status = Some(false);
                    return VerificationReport::failure(
                        checks,
                        format!("credential {} is not active (status: {other})", vc.id),
                    );
                }
            }
        }
        checks.credential_status = Some(true);

        // 7. Subject binding: signatures alone do not catch a credential
        // presented by someone it was not issued to.
        for vc in &vp.verifiable_credential {
            if vc.subject_id().as_ref() != Some(&vp.holder) {
                checks.subject_binding = Some(false);
                return VerificationReport::failure(
                    checks,
                    format!(
                        "credential {} was not issued to the presenting holder",
                        vc.id
                    ),
                );
            }
        }
        checks.subject_binding = Some(true);

        let subject = vp.verifiable_credential[0].credential_subject.clone();
        tracing::info!(holder = %vp.holder, "presentation verified");
        VerificationReport::success(checks, subject)
    }

    /// Resolve a DID and extract its registered address.
    fn registered_address(&self, did: &Did) -> Result<Address, String> {
        let document = self
            .resolver
            .resolve(did)
            .map_err(|e| format!("DID resolution failed: {e}"))?
            .ok_or_else(|| format!("DID {did} is not registered"))?;
        document
            .extract_address()
            .ok_or_else(|| format!("DID document for {did} carries no account binding"))
    }
}

/// Required fields present on the VP and each embedded credential.
fn structural_check(vp: &VerifiablePresentation) -> Result<(), String> {
    if !vp
        .presentation_type
        .iter()
        .any(|t| t == "VerifiablePresentation")
    {
        return Err("presentation type is missing VerifiablePresentation".to_string());
    }
    if vp.verifiable_credential.is_empty() {
        return Err("presentation embeds no credential".to_string());
    }
    if vp.proof.challenge.is_empty() {
        return Err("presentation proof carries no challenge".to_string());
    }
    if vp.proof.jws.is_none() {
        return Err("presentation is unsigned".to_string());
    }
    for vc in &vp.verifiable_credential {
        if !vc.credential_type.iter().any(|t| t == "VerifiableCredential") {
            return Err(format!(
                "credential {} type is missing VerifiableCredential",
                vc.id
            ));
        }
        if vc.proof.is_none() {
            return Err(format!("credential {} is unsigned", vc.id));
        }
    }
    Ok(())
}
