//! Plan Model
//!
//! Typed page-composition plans with canonical, content-derived versioning.
//!
//! # Core Concepts
//!
//! - [`Plan`]: block-ordered document with [`Metadata`] and [`Cursor`]s
//! - [`Block`] / [`BlockBody`]: one payload type per [`BlockKind`]
//! - [`canonicalize`]: order- and key-independent normal form
//! - [`PlanHash`]: SHA-256 of the canonical form, base64url on the wire
//! - [`VersionedPlan`]: validated, canonical plan with its hash
//! - [`PlanEdit`]: pure local edits
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_model::{default_plan, PlanEdit};
//!
//! let seeded = default_plan("acme", now)?;
//! println!("Hash: {}", seeded.hash());
//!
//! let edit = PlanEdit::MoveBlock { key: "chat".into(), to: 0 };
//! let edited = edit.apply(seeded.plan())?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod block;
mod canonical;
mod edit;
mod hash;
mod path;
mod plan;
mod seed;
mod validate;
mod versioned;

// Re-exports
pub use block::{
    Accessibility, Analytics, Block, BlockBody, BlockKind, ChatStarterData, CollectionRailData,
    CollectionSource, Cta, Facet, FacetKind, FilterBarData, HeroCarouselData, LatLng, Layout,
    LayoutWidth, MapGridData, PromoSlotData, SeoFragmentData, Slide,
};
pub use canonical::{canonicalize, into_canonical, is_canonical, renumber, sort_value_keys};
pub use edit::{EditError, PlanEdit};
pub use hash::{HashError, PlanHash, ENCODED_LEN};
pub use path::{FieldPath, Segment};
pub use plan::{Cursor, Metadata, Plan, DEFAULT_LOCALE, SCHEMA_VERSION};
pub use seed::{default_plan, DEFAULT_PLAN_ID, SEED_COMPOSER_VERSION};
pub use validate::{
    validate, ValidationErrors, Violation, ViolationCode, MAX_MAP_ZOOM, MAX_RAIL_LIMIT,
};
pub use versioned::{decode_plan, encode_plan, parse_plan, ModelError, VersionedPlan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
