//! Validated plans paired with their version token
//!
//! [`VersionedPlan`] is the single point where a plan is validated,
//! canonicalized and hashed. Anything holding one can rely on:
//! - the plan passed [`validate`]
//! - the plan is canonical
//! - `hash` is `PlanHash::of_plan(&plan)` and is stamped in `meta.planHash`

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::canonical::{canonicalize, into_canonical};
use crate::hash::{HashError, PlanHash};
use crate::plan::Plan;
use crate::validate::{validate, ValidationErrors};

/// Errors raised while turning input into a trusted plan
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Input is not JSON of the plan shape
    #[error("malformed plan: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Input parsed but violates document constraints
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// Hashing failed
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// `encodedPlan` is not base64url
    #[error("invalid plan encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
}

impl ModelError {
    /// Violations, if this is a validation failure
    #[must_use]
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Canonical, validated plan with its version token
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedPlan {
    plan: Plan,
    hash: PlanHash,
}

impl VersionedPlan {
    /// Validate, canonicalize and hash
    ///
    /// # Errors
    /// Returns [`ModelError::Invalid`] with every violation if the plan is
    /// not well formed
    pub fn new(plan: Plan) -> Result<Self, ModelError> {
        validate(&plan)?;
        let mut plan = into_canonical(plan);
        let hash = PlanHash::of_plan(&plan)?;
        plan.meta.plan_hash = Some(hash);
        Ok(Self { plan, hash })
    }

    /// Parse JSON, then [`VersionedPlan::new`]
    ///
    /// # Errors
    /// Returns [`ModelError::Malformed`] for parse failures and
    /// [`ModelError::Invalid`] for constraint failures
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let plan: Plan = serde_json::from_str(json)?;
        Self::new(plan)
    }

    /// The canonical plan
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// The version token
    #[inline]
    #[must_use]
    pub fn hash(&self) -> PlanHash {
        self.hash
    }

    /// Split into plan and token
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Plan, PlanHash) {
        (self.plan, self.hash)
    }

    /// Recompute the token and compare (useful after deserialization)
    #[must_use]
    pub fn verify(&self) -> bool {
        self.plan.meta.plan_hash == Some(self.hash)
            && PlanHash::of_plan(&self.plan).is_ok_and(|h| h == self.hash)
    }

    /// `encodedPlan` form of this plan
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn encoded(&self) -> Result<String, ModelError> {
        encode_plan(&self.plan)
    }
}

/// Parse and validate without canonicalizing
///
/// # Errors
/// Returns [`ModelError::Malformed`] or [`ModelError::Invalid`]
pub fn parse_plan(json: &str) -> Result<Plan, ModelError> {
    let plan: Plan = serde_json::from_str(json)?;
    validate(&plan)?;
    Ok(plan)
}

/// Unpadded base64url of the canonical plan JSON
///
/// # Errors
/// Returns error if serialization fails
pub fn encode_plan(plan: &Plan) -> Result<String, ModelError> {
    let bytes = serde_json::to_vec(&canonicalize(plan))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Reverse of [`encode_plan`]
///
/// # Errors
/// Returns error if the input is not base64url or not a plan
pub fn decode_plan(encoded: &str) -> Result<Plan, ModelError> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
