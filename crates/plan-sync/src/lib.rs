//! Plan Sync
//!
//! Optimistic-concurrency editing of plans held by an external store.
//!
//! # Core Concepts
//!
//! - [`PlanTransport`]: fetch-current and write-if-match against a store
//! - [`EditSession`]: local edits plus one compare-and-swap write at a time
//! - [`MemoryPlanStore`]: in-process store honoring the same contract
//! - [`HttpPlanTransport`]: the store's HTTP API
//! - [`SyncConfig`]: explicit client configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_sync::{EditSession, HttpPlanTransport, SaveOutcome, SyncConfig};
//! use plan_model::PlanEdit;
//!
//! let config = SyncConfig::new().with_env()?;
//! let transport = HttpPlanTransport::new(&config)?;
//! let session = EditSession::open(transport, config.locator()).await?;
//!
//! session.apply(&PlanEdit::MoveBlock { key: "chat".into(), to: 0 })?;
//! match session.save().await? {
//!     SaveOutcome::Saved(stored) => println!("now at {}", stored.hash),
//!     SaveOutcome::Conflicted(report) => println!("lost edit; store at {}", report.current_hash),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod http;
mod memory;
mod session;
mod state;
mod transport;
mod types;

pub use config::{ConfigError, SyncConfig, ENV_BASE_URL, ENV_TENANT, ENV_TIMEOUT_MS};
pub use error::{SessionError, TransportError, WriteError};
pub use http::{HttpPlanTransport, IF_MATCH};
pub use memory::MemoryPlanStore;
pub use session::{ConflictReport, EditSession, SaveOutcome};
pub use state::{allowed_transitions, validate_transition, SessionState};
pub use transport::PlanTransport;
pub use types::{
    ConflictBody, ErrorBody, PlanEnvelope, PlanLocator, StoredPlan, WriteRequest, CONFLICT_CODE,
    DEFAULT_PLAN_NAME,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
