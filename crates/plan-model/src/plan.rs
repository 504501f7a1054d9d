//! The plan document
//!
//! A [`Plan`] is an ordered set of [`Block`]s plus [`Metadata`] and the
//! pagination [`Cursor`]s of its streaming blocks. Plans are replaced
//! whole; nothing in this crate mutates a stored plan in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::block::Block;
use crate::hash::PlanHash;

/// Schema version tag understood by this crate
pub const SCHEMA_VERSION: &str = "plan.v1";

/// Locale assumed when a plan does not name one
pub const DEFAULT_LOCALE: &str = "en-US";

/// Block-ordered page-composition document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Plan {
    pub id: Uuid,
    pub tenant_id: String,
    pub path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub plan_cursors: Vec<Cursor>,
}

impl Plan {
    /// Empty plan at the current schema version
    #[must_use]
    pub fn new(
        id: Uuid,
        tenant_id: impl Into<String>,
        path: impl Into<String>,
        title: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id: tenant_id.into(),
            path: path.into(),
            title: title.into(),
            description: None,
            updated_at,
            version: SCHEMA_VERSION.to_string(),
            blocks: Vec::new(),
            meta: Metadata::default(),
            plan_cursors: Vec::new(),
        }
    }

    /// Find a block by key
    #[must_use]
    pub fn block(&self, key: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.key == key)
    }

    /// Index of a block by key, in current array order
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.key == key)
    }

    /// Block keys in current array order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.key.as_str()).collect()
    }
}

/// Plan-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    /// Version token, stamped when the plan leaves the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_hash: Option<PlanHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub cache_tags: Vec<String>,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            plan_hash: None,
            composer_version: None,
            generated_at: None,
            locale: default_locale(),
            cache_tags: Vec::new(),
            flags: BTreeMap::new(),
        }
    }
}

/// Pagination state of one streaming block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cursor {
    pub block_key: String,
    /// Opaque token handed back to the collection backend
    pub cursor: String,
    #[serde(default)]
    pub exhausted: bool,
}

impl Cursor {
    #[must_use]
    pub fn new(block_key: impl Into<String>, cursor: impl Into<String>) -> Self {
        Self {
            block_key: block_key.into(),
            cursor: cursor.into(),
            exhausted: false,
        }
    }
}
