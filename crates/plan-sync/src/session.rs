//! Edit session: one in-progress edit against one stored plan
//!
//! The session holds the reference `(plan, hash)` last seen from the store
//! and a local working copy. Saving sends the local copy with the reference
//! hash as precondition. The store decides what is current:
//! - accepted: the returned state becomes the new reference
//! - conflict: the local copy is dropped and the store's state is re-fetched
//! - anything else: local copy and reference stay as they were
//!
//! State lives behind a `parking_lot::Mutex` that is only held between
//! awaits, so all methods take `&self` and may be interleaved on one task.

use parking_lot::Mutex;
use plan_model::{canonicalize, validate, EditError, Plan, PlanEdit, PlanHash};

use crate::error::{SessionError, WriteError};
use crate::state::{validate_transition, SessionState};
use crate::transport::PlanTransport;
use crate::types::{PlanLocator, StoredPlan};

/// What a completed save did
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The store accepted the write; this is the new reference
    Saved(StoredPlan),
    /// The reference was stale; local edits were discarded
    Conflicted(ConflictReport),
}

impl SaveOutcome {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// The reference after the save
    #[must_use]
    pub fn reference(&self) -> &StoredPlan {
        match self {
            Self::Saved(stored) => stored,
            Self::Conflicted(report) => &report.reference,
        }
    }
}

/// A lost edit, reported to the caller so it can be redone
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictReport {
    /// Local plan that was not written
    pub discarded: Plan,
    /// Hash the write was conditioned on
    pub stale_hash: PlanHash,
    /// Hash the store reported when rejecting
    pub current_hash: PlanHash,
    /// Freshly fetched state, now the reference
    pub reference: StoredPlan,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    reference: StoredPlan,
    local: Plan,
    /// Bumped on every adopted reference
    epoch: u64,
}

impl Inner {
    fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        validate_transition(self.state, to)?;
        if self.state != to {
            tracing::debug!(from = %self.state, to = %to, "session transition");
        }
        self.state = to;
        Ok(())
    }

    /// Make `stored` the reference and drop local edits
    fn adopt(&mut self, stored: StoredPlan) -> Result<(), SessionError> {
        self.transition(SessionState::Idle)?;
        self.local = stored.plan.clone();
        self.reference = stored;
        self.epoch += 1;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        !same_content(&self.local, &self.reference.plan)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Saving => Err(SessionError::SaveInFlight),
            SessionState::Stale => Err(SessionError::Stale),
            SessionState::Idle | SessionState::Editing => Ok(()),
        }
    }
}

/// Plans are the same if their canonical forms match, ignoring the stamped hash
fn same_content(a: &Plan, b: &Plan) -> bool {
    let mut a = canonicalize(a);
    let mut b = canonicalize(b);
    a.meta.plan_hash = None;
    b.meta.plan_hash = None;
    a == b
}

/// Puts a dropped save back into `Editing`
struct SavingGuard<'a> {
    inner: &'a Mutex<Inner>,
    armed: bool,
}

impl SavingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock();
            if inner.state.is_saving() {
                tracing::warn!("save cancelled before completion");
                inner.state = SessionState::Editing;
            }
        }
    }
}

/// Compare-and-swap edit session over a [`PlanTransport`]
#[derive(Debug)]
pub struct EditSession<T> {
    transport: T,
    locator: PlanLocator,
    inner: Mutex<Inner>,
}

impl<T: PlanTransport> EditSession<T> {
    /// Fetch the current plan and start from it
    ///
    /// # Errors
    /// Returns error if the fetch fails
    pub async fn open(transport: T, locator: PlanLocator) -> Result<Self, SessionError> {
        let reference = transport.fetch_current(&locator).await?;
        tracing::info!(%locator, hash = %reference.hash.short(), "session opened");
        Ok(Self::from_reference(transport, locator, reference))
    }

    /// Start from an already fetched reference
    #[must_use]
    pub fn from_reference(transport: T, locator: PlanLocator, reference: StoredPlan) -> Self {
        let local = reference.plan.clone();
        Self {
            transport,
            locator,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                reference,
                local,
                epoch: 0,
            }),
        }
    }

    #[must_use]
    pub fn locator(&self) -> &PlanLocator {
        &self.locator
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn reference(&self) -> StoredPlan {
        self.inner.lock().reference.clone()
    }

    #[must_use]
    pub fn reference_hash(&self) -> PlanHash {
        self.inner.lock().reference.hash
    }

    #[must_use]
    pub fn local_plan(&self) -> Plan {
        self.inner.lock().local.clone()
    }

    /// Whether the local plan differs from the reference
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.lock().is_dirty()
    }

    /// Apply a local edit
    ///
    /// # Errors
    /// Returns [`SessionError::SaveInFlight`] while saving,
    /// [`SessionError::Stale`] until refreshed, or the edit's own error
    pub fn apply(&self, edit: &PlanEdit) -> Result<(), SessionError> {
        self.modify(|plan| edit.apply(plan))
    }

    /// Apply an arbitrary local transformation
    ///
    /// # Errors
    /// Same as [`EditSession::apply`]
    pub fn modify<F>(&self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&Plan) -> Result<Plan, EditError>,
    {
        let mut inner = self.inner.lock();
        inner.ensure_editable()?;
        let next = f(&inner.local)?;
        inner.local = next;
        let to = if inner.is_dirty() {
            SessionState::Editing
        } else {
            SessionState::Idle
        };
        inner.transition(to)
    }

    /// Drop local edits
    ///
    /// # Errors
    /// Returns [`SessionError::SaveInFlight`] while saving or
    /// [`SessionError::Stale`] until refreshed
    pub fn discard(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.ensure_editable()?;
        let reference = inner.reference.plan.clone();
        inner.local = reference;
        inner.transition(SessionState::Idle)
    }

    /// Write the local plan if the store is still at the reference hash
    ///
    /// # Errors
    /// - [`SessionError::NothingToSave`] when there is no local change
    /// - [`SessionError::SaveInFlight`] when another save is running
    /// - [`SessionError::Invalid`] when the local plan fails validation
    /// - [`SessionError::Transport`] / [`SessionError::Rejected`] on store failure;
    ///   local plan and reference are kept, so the save can be retried
    /// - [`SessionError::RefetchFailed`] when a conflict was detected but the
    ///   fresh state could not be fetched; the session is then stale
    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        let (candidate, expected) = {
            let mut inner = self.inner.lock();
            inner.ensure_editable()?;
            if !inner.is_dirty() {
                return Err(SessionError::NothingToSave);
            }
            validate(&inner.local)?;
            inner.transition(SessionState::Saving)?;
            let mut candidate = inner.local.clone();
            candidate.meta.plan_hash = None;
            (candidate, inner.reference.hash)
        };
        let mut guard = SavingGuard {
            inner: &self.inner,
            armed: true,
        };

        tracing::info!(locator = %self.locator, expected = %expected.short(), "saving plan");
        let written = self
            .transport
            .write_if_match(&self.locator, &candidate, &expected)
            .await;

        let outcome = match written {
            Ok(stored) => {
                tracing::info!(locator = %self.locator, hash = %stored.hash.short(), "plan saved");
                self.inner.lock().adopt(stored.clone())?;
                Ok(SaveOutcome::Saved(stored))
            }
            Err(WriteError::Conflict { current_hash }) => {
                tracing::warn!(
                    locator = %self.locator,
                    stale = %expected.short(),
                    current = %current_hash.short(),
                    "save conflicted; discarding local edits"
                );
                self.resolve_conflict(expected, current_hash).await
            }
            Err(WriteError::Invalid(violations)) => self.failed(SessionError::Invalid(violations)),
            Err(WriteError::Rejected { status, code }) => {
                self.failed(SessionError::Rejected { status, code })
            }
            Err(WriteError::Transport(err)) => self.failed(SessionError::Transport(err)),
        };
        guard.disarm();
        outcome
    }

    /// Back to `Editing` with local plan and reference untouched
    fn failed(&self, err: SessionError) -> Result<SaveOutcome, SessionError> {
        tracing::warn!(locator = %self.locator, error = %err, "save failed");
        self.inner.lock().transition(SessionState::Editing)?;
        Err(err)
    }

    async fn resolve_conflict(
        &self,
        stale_hash: PlanHash,
        current_hash: PlanHash,
    ) -> Result<SaveOutcome, SessionError> {
        let fetched = self.transport.fetch_current(&self.locator).await;
        let mut inner = self.inner.lock();
        let fallback = inner.reference.plan.clone();
        let discarded = std::mem::replace(&mut inner.local, fallback);
        match fetched {
            Ok(reference) => {
                inner.adopt(reference.clone())?;
                Ok(SaveOutcome::Conflicted(ConflictReport {
                    discarded,
                    stale_hash,
                    current_hash,
                    reference,
                }))
            }
            Err(source) => {
                tracing::warn!(
                    locator = %self.locator,
                    error = %source,
                    "re-fetch after conflict failed"
                );
                inner.transition(SessionState::Stale)?;
                Err(SessionError::RefetchFailed {
                    current_hash,
                    discarded: Box::new(discarded),
                    source,
                })
            }
        }
    }

    /// Drop local edits and adopt the store's current state
    ///
    /// If a save or conflict adopted a newer reference while the fetch was
    /// in flight, the fetched state is older than that reference and is
    /// dropped; the session keeps what it has and that reference is returned.
    ///
    /// # Errors
    /// Returns [`SessionError::SaveInFlight`] while saving, or the fetch error;
    /// a failed fetch leaves the session unchanged
    pub async fn refresh(&self) -> Result<StoredPlan, SessionError> {
        let epoch = {
            let inner = self.inner.lock();
            if inner.state.is_saving() {
                return Err(SessionError::SaveInFlight);
            }
            inner.epoch
        };
        let fresh = self.transport.fetch_current(&self.locator).await?;
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            tracing::debug!(
                locator = %self.locator,
                fetched = %fresh.hash.short(),
                kept = %inner.reference.hash.short(),
                "refresh superseded by a newer reference"
            );
            return Ok(inner.reference.clone());
        }
        if inner.state.is_saving() {
            return Err(SessionError::SaveInFlight);
        }
        tracing::info!(locator = %self.locator, hash = %fresh.hash.short(), "session refreshed");
        inner.adopt(fresh.clone())?;
        Ok(fresh)
    }
}
