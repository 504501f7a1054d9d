//! Structural validation of plans
//!
//! [`validate`] walks a plan and collects every [`Violation`] it finds, each
//! pointing at the offending field with a [`FieldPath`]. A plan is only
//! treated as authoritative once this returns `Ok`.

use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use crate::block::{Block, BlockBody, Cta, LatLng};
use crate::path::FieldPath;
use crate::plan::{Plan, SCHEMA_VERSION};

/// Largest page size a collection rail may request
pub const MAX_RAIL_LIMIT: u32 = 100;

/// Deepest map zoom level
pub const MAX_MAP_ZOOM: u8 = 22;

/// Machine-readable violation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Required,
    InvalidFormat,
    OutOfRange,
    UnsupportedVersion,
    DuplicateKey,
    DuplicateId,
    DuplicateCursor,
    UnknownBlock,
    NotStreaming,
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: FieldPath,
    pub code: ViolationCode,
    pub message: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("plan failed validation ({} violation(s)): {}", .0.len(), summarize(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    /// Violations in discovery order
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Whether any violation carries `code`
    #[must_use]
    pub fn has(&self, code: ViolationCode) -> bool {
        self.0.iter().any(|v| v.code == code)
    }

    /// Whether any violation points at `path`
    #[must_use]
    pub fn at(&self, path: &str) -> Option<&Violation> {
        self.0.iter().find(|v| v.path.to_string() == path)
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("static pattern"))
}

fn locale_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("static pattern")
    })
}

/// Validate a plan against the document model
///
/// # Errors
/// Returns every violation found; never stops at the first
pub fn validate(plan: &Plan) -> Result<(), ValidationErrors> {
    let mut v = Validator::default();
    v.plan(plan);
    if v.violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(v.violations))
    }
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn push(&mut self, path: FieldPath, code: ViolationCode, message: impl Into<String>) {
        self.violations.push(Violation {
            path,
            code,
            message: message.into(),
        });
    }

    fn required(&mut self, path: FieldPath, value: &str) {
        if value.trim().is_empty() {
            self.push(path, ViolationCode::Required, "must not be empty");
        }
    }

    fn plan(&mut self, plan: &Plan) {
        let root = FieldPath::root();
        self.required(root.child("tenantId"), &plan.tenant_id);
        self.required(root.child("title"), &plan.title);
        if !plan.path.starts_with('/') {
            self.push(
                root.child("path"),
                ViolationCode::InvalidFormat,
                format!("`{}` must start with `/`", plan.path),
            );
        }
        if plan.version != SCHEMA_VERSION {
            self.push(
                root.child("version"),
                ViolationCode::UnsupportedVersion,
                format!("`{}` is not `{SCHEMA_VERSION}`", plan.version),
            );
        }

        self.meta(plan);

        let mut keys: HashMap<&str, usize> = HashMap::new();
        let mut ids = HashSet::new();
        for (i, block) in plan.blocks.iter().enumerate() {
            let path = root.child("blocks").index(i);
            if let Some(first) = keys.insert(block.key.as_str(), i) {
                self.push(
                    path.child("key"),
                    ViolationCode::DuplicateKey,
                    format!("key `{}` already used by blocks[{first}]", block.key),
                );
            }
            if !ids.insert(block.id) {
                self.push(
                    path.child("id"),
                    ViolationCode::DuplicateId,
                    format!("id {} is not unique", block.id),
                );
            }
            self.block(&path, block);
        }

        self.cursors(plan);
    }

    fn meta(&mut self, plan: &Plan) {
        let meta = FieldPath::field("meta");
        if !locale_pattern().is_match(&plan.meta.locale) {
            self.push(
                meta.child("locale"),
                ViolationCode::InvalidFormat,
                format!("`{}` is not a locale tag", plan.meta.locale),
            );
        }
        for (i, tag) in plan.meta.cache_tags.iter().enumerate() {
            self.required(meta.child("cacheTags").index(i), tag);
        }
        for (i, name) in plan.meta.flags.keys().enumerate() {
            self.required(meta.child("flags").index(i), name);
        }
    }

    fn block(&mut self, path: &FieldPath, block: &Block) {
        if block.key.is_empty() {
            self.push(path.child("key"), ViolationCode::Required, "must not be empty");
        } else if !key_pattern().is_match(&block.key) {
            self.push(
                path.child("key"),
                ViolationCode::InvalidFormat,
                format!("`{}` must match [a-z0-9][a-z0-9_-]*", block.key),
            );
        }
        if let Some(columns) = block.layout.columns {
            if !(1..=12).contains(&columns) {
                self.push(
                    path.child("layout").child("columns"),
                    ViolationCode::OutOfRange,
                    format!("{columns} is outside 1..=12"),
                );
            }
        }
        if let Some(analytics) = &block.analytics {
            self.required(path.child("analytics").child("eventPrefix"), &analytics.event_prefix);
        }

        let data = path.child("data");
        match &block.body {
            BlockBody::FilterBar(bar) => {
                if bar.facets.is_empty() {
                    self.push(
                        data.child("facets"),
                        ViolationCode::Required,
                        "needs at least one facet",
                    );
                }
                let mut seen = HashSet::new();
                for (i, facet) in bar.facets.iter().enumerate() {
                    let fpath = data.child("facets").index(i);
                    self.required(fpath.child("id"), &facet.id);
                    self.required(fpath.child("label"), &facet.label);
                    if !seen.insert(facet.id.as_str()) {
                        self.push(
                            fpath.child("id"),
                            ViolationCode::DuplicateId,
                            format!("facet id `{}` is not unique", facet.id),
                        );
                    }
                }
            }
            BlockBody::HeroCarousel(hero) => {
                if hero.slides.is_empty() {
                    self.push(
                        data.child("slides"),
                        ViolationCode::Required,
                        "needs at least one slide",
                    );
                }
                for (i, slide) in hero.slides.iter().enumerate() {
                    let spath = data.child("slides").index(i);
                    self.required(spath.child("id"), &slide.id);
                    self.required(spath.child("title"), &slide.title);
                    self.required(spath.child("imageUrl"), &slide.image_url);
                    if let Some(cta) = &slide.cta {
                        self.cta(&spath.child("cta"), cta);
                    }
                }
            }
            BlockBody::CollectionRail(rail) => {
                self.required(data.child("title"), &rail.title);
                self.required(
                    data.child("source").child("collectionId"),
                    &rail.source.collection_id,
                );
                if !(1..=MAX_RAIL_LIMIT).contains(&rail.limit) {
                    self.push(
                        data.child("limit"),
                        ViolationCode::OutOfRange,
                        format!("{} is outside 1..={MAX_RAIL_LIMIT}", rail.limit),
                    );
                }
            }
            BlockBody::MapGrid(map) => {
                self.lat_lng(&data.child("center"), map.center);
                if map.zoom > MAX_MAP_ZOOM {
                    self.push(
                        data.child("zoom"),
                        ViolationCode::OutOfRange,
                        format!("{} is above {MAX_MAP_ZOOM}", map.zoom),
                    );
                }
            }
            BlockBody::PromoSlot(promo) => {
                self.required(data.child("placement"), &promo.placement);
                if let Some(cta) = &promo.fallback {
                    self.cta(&data.child("fallback"), cta);
                }
            }
            BlockBody::ChatStarter(chat) => {
                self.required(data.child("prompt"), &chat.prompt);
                for (i, suggestion) in chat.suggestions.iter().enumerate() {
                    self.required(data.child("suggestions").index(i), suggestion);
                }
            }
            BlockBody::SeoFragment(seo) => {
                self.required(data.child("title"), &seo.title);
                self.required(data.child("description"), &seo.description);
            }
        }
    }

    fn cta(&mut self, path: &FieldPath, cta: &Cta) {
        self.required(path.child("label"), &cta.label);
        self.required(path.child("href"), &cta.href);
    }

    fn lat_lng(&mut self, path: &FieldPath, point: LatLng) {
        if !(-90.0..=90.0).contains(&point.lat) {
            self.push(
                path.child("lat"),
                ViolationCode::OutOfRange,
                format!("{} is outside -90..=90", point.lat),
            );
        }
        if !(-180.0..=180.0).contains(&point.lng) {
            self.push(
                path.child("lng"),
                ViolationCode::OutOfRange,
                format!("{} is outside -180..=180", point.lng),
            );
        }
    }

    fn cursors(&mut self, plan: &Plan) {
        let mut seen = HashSet::new();
        for (i, cursor) in plan.plan_cursors.iter().enumerate() {
            let path = FieldPath::field("planCursors").index(i);
            if !seen.insert(cursor.block_key.as_str()) {
                self.push(
                    path.child("blockKey"),
                    ViolationCode::DuplicateCursor,
                    format!("block `{}` already has a cursor", cursor.block_key),
                );
            }
            match plan.block(&cursor.block_key) {
                None => self.push(
                    path.child("blockKey"),
                    ViolationCode::UnknownBlock,
                    format!("no block with key `{}`", cursor.block_key),
                ),
                Some(block) if !block.body.is_streaming() => self.push(
                    path.child("blockKey"),
                    ViolationCode::NotStreaming,
                    format!("block `{}` ({}) does not stream", block.key, block.kind()),
                ),
                Some(_) => {}
            }
        }
    }
}
