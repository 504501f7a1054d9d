//! Error types for plan synchronization
//!
//! Three failure classes need different recovery, so they stay distinct:
//! - validation: fix the plan, then resubmit
//! - conflict: the edit is lost; redo it against the fresh copy
//! - transport: resubmit the same write unchanged, unless the store
//!   answered with a client-error status

use plan_model::{EditError, Plan, PlanHash, ValidationErrors};

use crate::state::SessionState;
use crate::types::PlanLocator;

/// Failures talking to the store
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network, TLS, timeout or body read failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status without version information
    #[error("store returned status {status}: {}", .code.as_deref().unwrap_or("no error code"))]
    Status { status: u16, code: Option<String> },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No plan stored for this locator
    #[error("no plan stored for {0}")]
    NotFound(PlanLocator),
}

/// Outcome of a rejected compare-and-swap write
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The expected hash is stale
    #[error("version conflict: store is at {current_hash}")]
    Conflict { current_hash: PlanHash },

    /// The store found the candidate invalid and said why
    #[error(transparent)]
    Invalid(ValidationErrors),

    /// The store refused the write with an error code
    #[error("write rejected with status {status}: {code}")]
    Rejected { status: u16, code: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors surfaced by an edit session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Save requested with no local change
    #[error("nothing to save: local plan matches the reference")]
    NothingToSave,

    /// A save is already running on this session
    #[error("a save is already in flight")]
    SaveInFlight,

    /// The reference is known to be out of date; call `refresh` first
    #[error("session is stale; refresh before editing")]
    Stale,

    /// Local edit did not fit the plan
    #[error("edit failed: {0}")]
    Edit(#[from] EditError),

    /// Local plan fails validation, or the store reported violations
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The store refused the write
    #[error("store rejected the write with status {status}: {code}")]
    Rejected { status: u16, code: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Conflict detected, local edit discarded, but the re-fetch failed
    #[error("conflict at {current_hash}; re-fetch failed: {source}")]
    RefetchFailed {
        current_hash: PlanHash,
        discarded: Box<Plan>,
        #[source]
        source: TransportError,
    },

    #[error("illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SessionState, to: SessionState },
}

impl SessionError {
    /// Whether resubmitting the same write may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(TransportError::Status { status, .. })
            | Self::Rejected { status, .. } => *status >= 500,
            Self::Transport(TransportError::NotFound(_)) => false,
            Self::Transport(TransportError::Request(_) | TransportError::MalformedResponse(_)) => {
                true
            }
            _ => false,
        }
    }

    /// Whether the session needs `refresh` before it can continue
    #[inline]
    #[must_use]
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::Stale | Self::RefetchFailed { .. })
    }
}
