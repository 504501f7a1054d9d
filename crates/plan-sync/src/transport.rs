//! Transport seam between an edit session and the plan store
//!
//! The store is the only source of truth. Implementations must make
//! `write_if_match` atomic: compare the expected hash with the current one
//! and replace the plan in one step, or report the current hash.
//! Retries, backoff and auth belong to the implementation, not the session.

use async_trait::async_trait;
use plan_model::{Plan, PlanHash};

use crate::error::{TransportError, WriteError};
use crate::types::{PlanLocator, StoredPlan};

/// Fetch-current / write-with-precondition against a plan store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanTransport: Send + Sync {
    /// The store's present state; no precondition
    async fn fetch_current(&self, locator: &PlanLocator) -> Result<StoredPlan, TransportError>;

    /// Replace the plan if the store is still at `expected`
    ///
    /// Returns the new `(plan, hash, updatedAt)` on success and
    /// [`WriteError::Conflict`] carrying the current hash otherwise.
    async fn write_if_match(
        &self,
        locator: &PlanLocator,
        candidate: &Plan,
        expected: &PlanHash,
    ) -> Result<StoredPlan, WriteError>;
}

#[async_trait]
impl<T: PlanTransport + ?Sized> PlanTransport for std::sync::Arc<T> {
    async fn fetch_current(&self, locator: &PlanLocator) -> Result<StoredPlan, TransportError> {
        (**self).fetch_current(locator).await
    }

    async fn write_if_match(
        &self,
        locator: &PlanLocator,
        candidate: &Plan,
        expected: &PlanHash,
    ) -> Result<StoredPlan, WriteError> {
        (**self).write_if_match(locator, candidate, expected).await
    }
}
