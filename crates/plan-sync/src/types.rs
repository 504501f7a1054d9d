//! Core types for plan synchronization
//!
//! Defines:
//! - [`PlanLocator`]: which stored plan a session works on
//! - [`StoredPlan`]: a `(plan, hash, updatedAt)` triple as returned by a store
//! - wire bodies of the HTTP plan API

use chrono::{DateTime, Utc};
use plan_model::{ModelError, Plan, PlanHash, VersionedPlan};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Name of the plan every tenant has
pub const DEFAULT_PLAN_NAME: &str = "default";

/// Address of one stored plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanLocator {
    pub tenant_id: String,
    pub name: String,
}

impl PlanLocator {
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
        }
    }

    /// The tenant's default plan
    #[must_use]
    pub fn default_for(tenant_id: impl Into<String>) -> Self {
        Self::new(tenant_id, DEFAULT_PLAN_NAME)
    }
}

impl Display for PlanLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.name)
    }
}

/// Current state of a plan as the store reports it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlan {
    pub plan: Plan,
    pub hash: PlanHash,
    pub updated_at: DateTime<Utc>,
}

impl StoredPlan {
    /// From a locally versioned plan; `updated_at` comes from the plan
    #[must_use]
    pub fn from_versioned(versioned: VersionedPlan) -> Self {
        let (plan, hash) = versioned.into_parts();
        let updated_at = plan.updated_at;
        Self {
            plan,
            hash,
            updated_at,
        }
    }
}

/// Success body of `GET` and `PUT /plan/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEnvelope {
    pub plan: Plan,
    pub plan_hash: PlanHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_plan: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PlanEnvelope {
    /// Envelope for a stored plan, including `encodedPlan`
    ///
    /// # Errors
    /// Returns error if the plan cannot be encoded
    pub fn from_stored(stored: &StoredPlan) -> Result<Self, ModelError> {
        Ok(Self {
            plan: stored.plan.clone(),
            plan_hash: stored.hash,
            encoded_plan: Some(plan_model::encode_plan(&stored.plan)?),
            updated_at: stored.updated_at,
        })
    }

    #[must_use]
    pub fn into_stored(self) -> StoredPlan {
        StoredPlan {
            plan: self.plan,
            hash: self.plan_hash,
            updated_at: self.updated_at,
        }
    }
}

/// Body of `PUT /plan/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    pub plan: Plan,
}

/// Body of a `412` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictBody {
    pub error: String,
    pub plan_hash: PlanHash,
}

/// Body of any other error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error code of a `412` body
pub const CONFLICT_CODE: &str = "plan_conflict";
