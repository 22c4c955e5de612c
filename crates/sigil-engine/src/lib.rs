//! # sigil-engine — Stateful Services and the Verification Pipeline
//!
//! The runtime half of the trust engine. Where `sigil-vc` is pure value
//! transformation, this crate owns the process-lifetime mutable state and
//! the orchestration around it:
//!
//! - **Challenge service** ([`ChallengeService`]) — single-use,
//!   time-limited anti-replay tokens with atomic check-and-mark.
//! - **VP session store** ([`VpSessionStore`]) — the ephemeral hand-off
//!   between a mobile holder and a staff verifier during QR check-in.
//! - **TTL store capability** ([`ExpiringStore`], [`MemoryStore`]) — the
//!   injectable backing store both services run on. A single-instance
//!   deployment uses the in-memory map; a horizontally-scaled one swaps
//!   in a shared store behind the same interface.
//! - **Collaborator traits** ([`DidResolver`],
//!   [`CredentialStatusRegistry`]) — the two external resources the
//!   pipeline consults. Implementations own their transport timeouts;
//!   the pipeline treats any error as a failed check.
//! - **Verification pipeline** ([`Verifier`]) — the ordered,
//!   short-circuiting check sequence producing a structured
//!   [`VerificationReport`].
//!
//! Both stateful services hold process-local state only: a restart
//! invalidates all outstanding challenges and sessions. That is accepted,
//! documented behavior, not a bug.

pub mod challenge;
pub mod pipeline;
pub mod resolver;
pub mod session;
pub mod store;
pub mod sweeper;

// Re-export primary types.
pub use challenge::{Challenge, ChallengeConfig, ChallengeError, ChallengeService, ChallengeState};
pub use pipeline::{VerificationChecks, VerificationReport, Verifier};
pub use resolver::{
    CollaboratorError, CredentialStatus, CredentialStatusRegistry, DidResolver, MemoryResolver,
    MemoryStatusRegistry,
};
pub use session::{
    SessionConfig, SessionId, SessionState, SessionStatus, VpSessionRecord, VpSessionStore,
};
pub use store::{Expiring, ExpiringStore, MemoryStore};
pub use sweeper::Sweeper;
