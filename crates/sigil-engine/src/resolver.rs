//! # External collaborators
//!
//! The verification pipeline consults two external resources: a DID
//! resolver (usually backed by the on-chain registry) and a
//! credential-status registry. Both sit behind traits so deployments can
//! plug in their transport of choice.
//!
//! Implementations own their transport timeouts — a resolver that talks
//! JSON-RPC configures its own deadline the same way an HTTP client
//! would. The pipeline does not distinguish timeout from any other
//! failure: every [`CollaboratorError`] fails the check it was serving
//! (fail closed).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sigil_core::{CredentialId, Did};
use sigil_vc::DidDocument;

/// Errors from external-resource calls.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// The resource could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its configured deadline.
    #[error("collaborator timed out after {0}s")]
    Timeout(u64),

    /// The resource answered with something unusable.
    #[error("malformed collaborator response: {0}")]
    MalformedResponse(String),
}

/// Resolves a DID to its registered document.
pub trait DidResolver: Send + Sync {
    /// Fetch the document for `did`, or `None` if the DID is not
    /// registered.
    fn resolve(&self, did: &Did) -> Result<Option<DidDocument>, CollaboratorError>;
}

/// Registry-reported lifecycle status of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialStatus {
    /// Usable.
    Active,
    /// Explicitly withdrawn by the issuer.
    Revoked,
    /// Temporarily not usable.
    Suspended,
    /// The registry has no record.
    Unknown,
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CredentialStatus::Active => "ACTIVE",
            CredentialStatus::Revoked => "REVOKED",
            CredentialStatus::Suspended => "SUSPENDED",
            CredentialStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Reports the registry status of a credential.
pub trait CredentialStatusRegistry: Send + Sync {
    /// Current status of the credential with id `vc_id`.
    fn status(&self, vc_id: &CredentialId) -> Result<CredentialStatus, CollaboratorError>;
}

/// In-memory [`DidResolver`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    documents: DashMap<Did, DidDocument>,
}

impl MemoryResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a document under its own id.
    pub fn register(&self, document: DidDocument) {
        self.documents.insert(document.id.clone(), document);
    }
}

impl DidResolver for MemoryResolver {
    fn resolve(&self, did: &Did) -> Result<Option<DidDocument>, CollaboratorError> {
        Ok(self.documents.get(did).map(|d| d.value().clone()))
    }
}

/// In-memory [`CredentialStatusRegistry`] for tests and single-process
/// deployments. Credentials without an entry report [`CredentialStatus::Unknown`].
#[derive(Debug, Default)]
pub struct MemoryStatusRegistry {
    statuses: DashMap<CredentialId, CredentialStatus>,
}

impl MemoryStatusRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status for a credential id.
    pub fn set(&self, vc_id: CredentialId, status: CredentialStatus) {
        self.statuses.insert(vc_id, status);
    }
}

impl CredentialStatusRegistry for MemoryStatusRegistry {
    fn status(&self, vc_id: &CredentialId) -> Result<CredentialStatus, CollaboratorError> {
        Ok(self
            .statuses
            .get(vc_id)
            .map(|s| *s)
            .unwrap_or(CredentialStatus::Unknown))
    }
}
