//! # Challenge service
//!
//! Single-use, time-limited anti-replay tokens. A challenge is 32 random
//! bytes, hex-encoded with a `0x` prefix, valid for a bounded TTL and
//! consumable exactly once.
//!
//! ## Security Invariants
//!
//! - `verify` checks existence, non-expiry, and not-yet-used, then marks
//!   the challenge used — all under one exclusive entry lock. Two
//!   concurrent verifications of the same value produce exactly one
//!   success and one [`ChallengeError::Replayed`], never two successes.
//! - State is process-local. A restart invalidates every outstanding
//!   challenge; holders simply request a new one.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use thiserror::Error;

use sigil_core::Timestamp;

use crate::store::{ExpiringStore, MemoryStore};

/// Default challenge lifetime.
const DEFAULT_TTL_SECONDS: i64 = 300;

/// Configuration for the challenge service.
#[derive(Debug, Clone)]
pub struct ChallengeConfig {
    /// Seconds a challenge stays verifiable after creation.
    pub ttl_seconds: i64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

/// A freshly-issued challenge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// `0x` + 64 hex characters of 32 random bytes.
    pub value: String,
    /// When the challenge was issued.
    pub created_at: Timestamp,
    /// When the challenge stops verifying.
    pub expires_at: Timestamp,
}

/// Errors from challenge verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    /// The challenge was never issued (or was already swept).
    #[error("unknown challenge")]
    NotFound,

    /// The challenge exists but its TTL elapsed.
    #[error("challenge expired")]
    Expired,

    /// The challenge was already consumed.
    #[error("challenge already used")]
    Replayed,
}

/// Per-challenge state behind the store key.
#[derive(Debug, Clone)]
pub struct ChallengeState {
    used: bool,
}

/// Issues and consumes single-use challenges.
///
/// Generic over the backing [`ExpiringStore`]; defaults to the in-memory
/// map for single-instance deployments.
pub struct ChallengeService<S = MemoryStore<ChallengeState>> {
    store: S,
    config: ChallengeConfig,
}

impl ChallengeService<MemoryStore<ChallengeState>> {
    /// Create a service over a fresh in-memory store.
    pub fn new(config: ChallengeConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl Default for ChallengeService<MemoryStore<ChallengeState>> {
    fn default() -> Self {
        Self::new(ChallengeConfig::default())
    }
}

impl<S: ExpiringStore<ChallengeState>> ChallengeService<S> {
    /// Create a service over an injected store.
    pub fn with_store(store: S, config: ChallengeConfig) -> Self {
        Self { store, config }
    }

    /// Issue a fresh challenge.
    pub fn create(&self) -> Challenge {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let value = format!("0x{}", hex::encode(bytes));

        let created_at = Timestamp::now();
        let expires_at = created_at.plus_seconds(self.config.ttl_seconds);
        self.store
            .put(value.clone(), ChallengeState { used: false }, expires_at);

        tracing::debug!(challenge = %truncated(&value), %expires_at, "challenge issued");
        Challenge {
            value,
            created_at,
            expires_at,
        }
    }

    /// Atomically verify and consume a challenge.
    ///
    /// # Errors
    ///
    /// - [`ChallengeError::NotFound`] for a value never issued here.
    /// - [`ChallengeError::Expired`] past the TTL.
    /// - [`ChallengeError::Replayed`] when already consumed.
    pub fn verify(&self, value: &str) -> Result<(), ChallengeError> {
        let now = Timestamp::now();
        // The whole decision runs inside one `update` call: existence,
        // expiry, used-flag check, and the mark all happen under the
        // entry's exclusive lock.
        let outcome = self.store.update(value, |entry| {
            if entry.is_expired(&now) {
                return Err(ChallengeError::Expired);
            }
            if entry.value.used {
                return Err(ChallengeError::Replayed);
            }
            entry.value.used = true;
            Ok(())
        });

        let result = outcome.unwrap_or(Err(ChallengeError::NotFound));
        match &result {
            Ok(()) => tracing::debug!(challenge = %truncated(value), "challenge consumed"),
            Err(e) => tracing::debug!(challenge = %truncated(value), error = %e, "challenge rejected"),
        }
        result
    }

    /// Remove expired challenges; returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.store.sweep_expired(Timestamp::now());
        if removed > 0 {
            tracing::debug!(removed, "swept expired challenges");
        }
        removed
    }
}

fn truncated(value: &str) -> &str {
    value.get(..10).unwrap_or(value)
}
