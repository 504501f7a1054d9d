//! Edit session lifecycle
//!
//! ```text
//! Idle ──apply──▶ Editing ──save──▶ Saving ──ok/conflict──▶ Idle
//!   ▲               │  ▲              │
//!   └───discard─────┘  └──failed──────┤
//!   ▲                                 │
//!   └──────refresh────── Stale ◀──────┘ re-fetch failed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Local plan equals the reference
    Idle,
    /// Local edits pending
    Editing,
    /// A compare-and-swap write is in flight
    Saving,
    /// A conflict was seen but the fresh copy could not be fetched
    Stale,
}

impl SessionState {
    #[inline]
    #[must_use]
    pub fn is_saving(self) -> bool {
        self == Self::Saving
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::Stale => "stale",
        };
        f.write_str(name)
    }
}

/// Validates a state transition
///
/// # Errors
/// Returns [`SessionError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: SessionState, to: SessionState) -> Result<(), SessionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: SessionState) -> &'static [SessionState] {
    use SessionState::*;
    match from {
        Idle => &[Idle, Editing],
        Editing => &[Editing, Saving, Idle],
        Saving => &[Idle, Editing, Stale],
        Stale => &[Idle],
    }
}

fn allowed(from: SessionState, to: SessionState) -> bool {
    allowed_transitions(from).contains(&to)
}
