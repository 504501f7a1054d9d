//! In-process plan store
//!
//! Honors the compare-and-swap contract under a single mutex: the hash
//! comparison and the replacement happen while the lock is held, so two
//! writers holding the same expected hash can never both succeed.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use plan_model::{ModelError, Plan, PlanHash, VersionedPlan};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{TransportError, WriteError};
use crate::transport::PlanTransport;
use crate::types::{PlanLocator, StoredPlan};

/// Store backed by a `HashMap`, for tests and local tooling
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: Mutex<HashMap<PlanLocator, StoredPlan>>,
    writes: AtomicU64,
}

impl MemoryPlanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `plan` at `locator`
    ///
    /// # Errors
    /// Returns error if the plan does not validate
    pub fn seeded(locator: PlanLocator, plan: Plan) -> Result<Self, ModelError> {
        let store = Self::new();
        store.insert(locator, plan)?;
        Ok(store)
    }

    /// Replace whatever is stored at `locator`, with no precondition
    ///
    /// # Errors
    /// Returns error if the plan does not validate
    pub fn insert(&self, locator: PlanLocator, plan: Plan) -> Result<StoredPlan, ModelError> {
        let stored = StoredPlan::from_versioned(VersionedPlan::new(plan)?);
        tracing::debug!(%locator, hash = %stored.hash, "seeding plan");
        self.plans.lock().insert(locator, stored.clone());
        Ok(stored)
    }

    /// Current state, if any
    #[must_use]
    pub fn current(&self, locator: &PlanLocator) -> Option<StoredPlan> {
        self.plans.lock().get(locator).cloned()
    }

    /// Number of accepted compare-and-swap writes
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = Utc::now();
        let floor = previous + TimeDelta::milliseconds(1);
        now.max(floor)
    }
}

#[async_trait]
impl PlanTransport for MemoryPlanStore {
    async fn fetch_current(&self, locator: &PlanLocator) -> Result<StoredPlan, TransportError> {
        self.current(locator)
            .ok_or_else(|| TransportError::NotFound(locator.clone()))
    }

    async fn write_if_match(
        &self,
        locator: &PlanLocator,
        candidate: &Plan,
        expected: &PlanHash,
    ) -> Result<StoredPlan, WriteError> {
        if candidate.tenant_id != locator.tenant_id {
            return Err(WriteError::Rejected {
                status: 400,
                code: "tenant_mismatch".to_string(),
            });
        }

        let mut plans = self.plans.lock();
        let current = plans
            .get(locator)
            .ok_or_else(|| TransportError::NotFound(locator.clone()))?;

        if current.hash != *expected {
            tracing::info!(
                %locator,
                expected = %expected,
                current = %current.hash,
                "rejecting stale write"
            );
            return Err(WriteError::Conflict {
                current_hash: current.hash,
            });
        }

        let mut next = candidate.clone();
        next.updated_at = Self::next_timestamp(current.updated_at);
        next.meta.plan_hash = None;
        let versioned = VersionedPlan::new(next).map_err(|err| match err {
            ModelError::Invalid(violations) => WriteError::Invalid(violations),
            other => WriteError::Rejected {
                status: 500,
                code: format!("internal: {other}"),
            },
        })?;

        let stored = StoredPlan::from_versioned(versioned);
        tracing::info!(%locator, previous = %expected, hash = %stored.hash, "plan replaced");
        plans.insert(locator.clone(), stored.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(stored)
    }
}
