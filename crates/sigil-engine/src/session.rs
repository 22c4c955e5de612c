//! # VP session store
//!
//! The ephemeral hand-off behind QR-code check-in: a mobile holder
//! submits a signed presentation and receives a session id to render as a
//! QR code; a staff device runs the verification pipeline and flips the
//! session to its terminal state; the mobile device polls until it sees
//! that outcome or the session lapses.
//!
//! ## Invariants
//!
//! - A session leaves `Pending` at most once. The first terminal
//!   transition wins; later attempts are no-ops that preserve the first
//!   outcome.
//! - Reads of missing or lapsed sessions return `None`; expiry is lazy.
//! - State is process-local and vanishes on restart.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use sigil_core::Timestamp;
use sigil_vc::VerifiablePresentation;

use crate::store::{ExpiringStore, MemoryStore};

/// Default session lifetime.
const DEFAULT_TTL_SECONDS: i64 = 300;

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seconds a session stays pollable after creation.
    pub ttl_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

/// A unique identifier for a presentation hand-off session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Awaiting staff verification.
    Pending,
    /// Verified successfully — terminal.
    Verified,
    /// Verification failed — terminal.
    Failed,
    /// Lapsed unattended — terminal.
    Expired,
}

impl SessionStatus {
    /// Whether this state admits no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Pending)
    }
}

/// Everything stored for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpSessionRecord {
    /// The session identifier.
    pub session_id: SessionId,
    /// The presentation handed off by the holder.
    pub vp: VerifiablePresentation,
    /// The challenge the presentation is bound to.
    pub challenge: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Check-in payload attached at the terminal transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_data: Option<Value>,
    /// When the session stops being served.
    pub expires_at: Timestamp,
}

/// Per-session state behind the store key.
#[derive(Debug, Clone)]
pub struct SessionState {
    vp: VerifiablePresentation,
    challenge: String,
    status: SessionStatus,
    checkin_data: Option<Value>,
}

/// Ephemeral store for presentation hand-off sessions.
pub struct VpSessionStore<S = MemoryStore<SessionState>> {
    store: S,
    config: SessionConfig,
}

impl VpSessionStore<MemoryStore<SessionState>> {
    /// Create a store over a fresh in-memory map.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl Default for VpSessionStore<MemoryStore<SessionState>> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<S: ExpiringStore<SessionState>> VpSessionStore<S> {
    /// Create a store over an injected backing map.
    pub fn with_store(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Open a pending session for a submitted presentation.
    pub fn create(&self, vp: VerifiablePresentation, challenge: impl Into<String>) -> SessionId {
        let id = SessionId::new();
        let expires_at = Timestamp::now().plus_seconds(self.config.ttl_seconds);
        self.store.put(
            id.to_string(),
            SessionState {
                vp,
                challenge: challenge.into(),
                status: SessionStatus::Pending,
                checkin_data: None,
            },
            expires_at,
        );
        tracing::debug!(session = %id, %expires_at, "session opened");
        id
    }

    /// Current status, or `None` for unknown and lapsed sessions.
    pub fn get_status(&self, id: &SessionId) -> Option<SessionStatus> {
        self.store.get(&id.to_string()).map(|e| e.value.status)
    }

    /// Full session record, or `None` for unknown and lapsed sessions.
    pub fn get_info(&self, id: &SessionId) -> Option<VpSessionRecord> {
        let entry = self.store.get(&id.to_string())?;
        Some(VpSessionRecord {
            session_id: id.clone(),
            vp: entry.value.vp,
            challenge: entry.value.challenge,
            status: entry.value.status,
            checkin_data: entry.value.checkin_data,
            expires_at: entry.expires_at,
        })
    }

    /// Transition a pending session to a terminal outcome.
    ///
    /// Only `Verified` and `Failed` are accepted targets. Returns `true`
    /// when this call performed the transition; `false` when the session
    /// is unknown, lapsed, already terminal, or the target is not a
    /// terminal outcome. The first recorded outcome is never overwritten.
    pub fn update_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        checkin_data: Option<Value>,
    ) -> bool {
        if !matches!(status, SessionStatus::Verified | SessionStatus::Failed) {
            tracing::warn!(session = %id, ?status, "rejected non-terminal transition target");
            return false;
        }

        let now = Timestamp::now();
        let transitioned = self
            .store
            .update(&id.to_string(), |entry| {
                if entry.is_expired(&now) {
                    entry.value.status = SessionStatus::Expired;
                    return false;
                }
                if entry.value.status != SessionStatus::Pending {
                    return false;
                }
                entry.value.status = status;
                entry.value.checkin_data = checkin_data;
                true
            })
            .unwrap_or(false);

        if transitioned {
            tracing::info!(session = %id, ?status, "session transitioned");
        } else {
            tracing::debug!(session = %id, ?status, "transition ignored");
        }
        transitioned
    }

    /// Remove lapsed sessions; returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.store.sweep_expired(Timestamp::now());
        if removed > 0 {
            tracing::debug!(removed, "swept expired sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sigil_crypto::SigningKey;
    use sigil_vc::{create_did, VerifiablePresentation};

    fn make_vp() -> (VerifiablePresentation, String) {
        let key = SigningKey::generate();
        let holder = create_did("citizen", &key.address().to_hex()).unwrap();
        let challenge = format!("0x{}", "ab".repeat(32));
        let mut vp = VerifiablePresentation::build(&holder, vec![], challenge.as_str());
        vp.sign(&key).unwrap();
        (vp, challenge)
    }

    fn lapsed_store() -> VpSessionStore {
        VpSessionStore::new(SessionConfig { ttl_seconds: -1 })
    }

    #[test]
    fn create_opens_pending_session() {
        let store = VpSessionStore::default();
        let (vp, challenge) = make_vp();
        let id = store.create(vp.clone(), challenge.as_str());

        assert_eq!(store.get_status(&id), Some(SessionStatus::Pending));
        let info = store.get_info(&id).unwrap();
        assert_eq!(info.vp, vp);
        assert_eq!(info.challenge, challenge);
        assert!(info.checkin_data.is_none());
    }

    #[test]
    fn unknown_session_reads_none() {
        let store = VpSessionStore::default();
        let id: SessionId = "8c3f2d4a-90f1-4f6e-8a9d-1b2c3d4e5f60".parse().unwrap();
        assert!(store.get_status(&id).is_none());
        assert!(store.get_info(&id).is_none());
    }

    #[test]
    fn lapsed_session_reads_none() {
        let store = lapsed_store();
        let (vp, challenge) = make_vp();
        let id = store.create(vp, challenge);
        assert!(store.get_status(&id).is_none());
        assert!(store.get_info(&id).is_none());
    }

    #[test]
    fn first_terminal_transition_wins() {
        let store = VpSessionStore::default();
        let (vp, challenge) = make_vp();
        let id = store.create(vp, challenge);

        assert!(store.update_status(&id, SessionStatus::Verified, Some(json!({"gate": "A"}))));
        // The losing transition is a no-op, not an overwrite.
        assert!(!store.update_status(&id, SessionStatus::Failed, None));

        let info = store.get_info(&id).unwrap();
        assert_eq!(info.status, SessionStatus::Verified);
        assert_eq!(info.checkin_data, Some(json!({"gate": "A"})));
    }

    #[test]
    fn non_terminal_targets_are_rejected() {
        let store = VpSessionStore::default();
        let (vp, challenge) = make_vp();
        let id = store.create(vp, challenge);

        assert!(!store.update_status(&id, SessionStatus::Pending, None));
        assert!(!store.update_status(&id, SessionStatus::Expired, None));
        assert_eq!(store.get_status(&id), Some(SessionStatus::Pending));
    }

    #[test]
    fn lapsed_session_cannot_transition() {
        let store = lapsed_store();
        let (vp, challenge) = make_vp();
        let id = store.create(vp, challenge);
        assert!(!store.update_status(&id, SessionStatus::Verified, None));
    }

    #[test]
    fn concurrent_transitions_have_one_winner() {
        use std::sync::Arc;

        let store = Arc::new(VpSessionStore::default());
        for _ in 0..20 {
            let (vp, challenge) = make_vp();
            let id = store.create(vp, challenge);

            let handles: Vec<_> = [SessionStatus::Verified, SessionStatus::Failed]
                .into_iter()
                .cycle()
                .take(4)
                .map(|target| {
                    let store = Arc::clone(&store);
                    let id = id.clone();
                    std::thread::spawn(move || store.update_status(&id, target, None))
                })
                .collect();

            let wins = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(wins, 1, "exactly one transition may win");
        }
    }

    #[test]
    fn sweep_removes_lapsed_sessions() {
        let store = lapsed_store();
        let (vp, challenge) = make_vp();
        store.create(vp, challenge);
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.sweep_expired(), 0);
    }

    #[test]
    fn record_serializes_with_camel_case_names() {
        let store = VpSessionStore::default();
        let (vp, challenge) = make_vp();
        let id = store.create(vp, challenge);
        store.update_status(&id, SessionStatus::Verified, Some(json!({"seat": 4})));

        let val = serde_json::to_value(store.get_info(&id).unwrap()).unwrap();
        assert!(val.get("sessionId").is_some());
        assert!(val.get("checkinData").is_some());
        assert!(val.get("expiresAt").is_some());
        assert_eq!(val["status"], "verified");
    }

    #[test]
    fn status_terminality() {
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(SessionStatus::Verified.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Expired.is_terminal());
    }
}
