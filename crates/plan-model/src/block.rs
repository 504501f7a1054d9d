//! Blocks: positioned, typed content units of a plan
//!
//! A [`Block`] carries the attributes shared by every kind plus a
//! [`BlockBody`], a closed sum type with one payload struct per
//! [`BlockKind`]. The wire form keeps `kind` and `data` side by side:
//!
//! ```json
//! { "id": "…", "key": "hero", "kind": "heroCarousel", "order": 0,
//!   "layout": { "width": "full" }, "data": { "slides": [] } }
//! ```
//!
//! Deserialization picks the payload type from `kind`, so a `data` object
//! that does not match its declared kind is rejected.

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Block variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    FilterBar,
    HeroCarousel,
    CollectionRail,
    MapGrid,
    PromoSlot,
    ChatStarter,
    SeoFragment,
}

impl BlockKind {
    /// Every kind, in declaration order
    pub const ALL: [BlockKind; 7] = [
        BlockKind::FilterBar,
        BlockKind::HeroCarousel,
        BlockKind::CollectionRail,
        BlockKind::MapGrid,
        BlockKind::PromoSlot,
        BlockKind::ChatStarter,
        BlockKind::SeoFragment,
    ];

    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BlockKind::FilterBar => "filterBar",
            BlockKind::HeroCarousel => "heroCarousel",
            BlockKind::CollectionRail => "collectionRail",
            BlockKind::MapGrid => "mapGrid",
            BlockKind::PromoSlot => "promoSlot",
            BlockKind::ChatStarter => "chatStarter",
            BlockKind::SeoFragment => "seoFragment",
        }
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum BlockBody {
    FilterBar(FilterBarData),
    HeroCarousel(HeroCarouselData),
    CollectionRail(CollectionRailData),
    MapGrid(MapGridData),
    PromoSlot(PromoSlotData),
    ChatStarter(ChatStarterData),
    SeoFragment(SeoFragmentData),
}

impl BlockBody {
    /// The variant tag
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        match self {
            BlockBody::FilterBar(_) => BlockKind::FilterBar,
            BlockBody::HeroCarousel(_) => BlockKind::HeroCarousel,
            BlockBody::CollectionRail(_) => BlockKind::CollectionRail,
            BlockBody::MapGrid(_) => BlockKind::MapGrid,
            BlockBody::PromoSlot(_) => BlockKind::PromoSlot,
            BlockBody::ChatStarter(_) => BlockKind::ChatStarter,
            BlockBody::SeoFragment(_) => BlockKind::SeoFragment,
        }
    }

    /// Build a body from a kind tag and an untyped `data` value
    ///
    /// # Errors
    /// Returns error if `data` does not match the payload schema of `kind`
    pub fn from_parts(kind: BlockKind, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            BlockKind::FilterBar => BlockBody::FilterBar(serde_json::from_value(data)?),
            BlockKind::HeroCarousel => BlockBody::HeroCarousel(serde_json::from_value(data)?),
            BlockKind::CollectionRail => BlockBody::CollectionRail(serde_json::from_value(data)?),
            BlockKind::MapGrid => BlockBody::MapGrid(serde_json::from_value(data)?),
            BlockKind::PromoSlot => BlockBody::PromoSlot(serde_json::from_value(data)?),
            BlockKind::ChatStarter => BlockBody::ChatStarter(serde_json::from_value(data)?),
            BlockKind::SeoFragment => BlockBody::SeoFragment(serde_json::from_value(data)?),
        })
    }

    /// Whether this block pages its content through a plan cursor
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, BlockBody::CollectionRail(rail) if rail.streaming)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterBarData {
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub sticky: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Facet {
    pub id: String,
    pub label: String,
    pub kind: FacetKind,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetKind {
    Select,
    Range,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeroCarouselData {
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Slide {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<Cta>,
}

/// Call-to-action link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cta {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionRailData {
    pub title: String,
    pub source: CollectionSource,
    pub limit: u32,
    #[serde(default)]
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionSource {
    pub collection_id: String,
    /// Free-form query parameters passed through to the collection backend
    #[serde(default)]
    pub query: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapGridData {
    pub center: LatLng,
    pub zoom: u8,
    #[serde(default)]
    pub listing_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PromoSlotData {
    pub placement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Cta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatStarterData {
    pub prompt: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeoFragmentData {
    pub title: String,
    pub description: String,
    /// Structured data emitted verbatim into the page
    #[serde(default)]
    pub json_ld: Value,
}

// ---------------------------------------------------------------------------
// Shared attributes
// ---------------------------------------------------------------------------

/// Presentation hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Layout {
    #[serde(default)]
    pub width: LayoutWidth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutWidth {
    Full,
    #[default]
    Contained,
    Narrow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Analytics {
    pub event_prefix: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Accessibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

/// One positioned, typed content unit
///
/// # Invariants
/// - `id` is stable across reorders
/// - `key` is unique within its plan
/// - the body's kind never changes after creation
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: Uuid,
    pub key: String,
    pub order: u32,
    pub layout: Layout,
    pub analytics: Option<Analytics>,
    pub accessibility: Option<Accessibility>,
    pub body: BlockBody,
}

impl Block {
    /// Create a block with default layout at order 0
    #[must_use]
    pub fn new(id: Uuid, key: impl Into<String>, body: BlockBody) -> Self {
        Self {
            id,
            key: key.into(),
            order: 0,
            layout: Layout::default(),
            analytics: None,
            accessibility: None,
            body,
        }
    }

    /// With explicit order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// With layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// With analytics metadata
    #[inline]
    #[must_use]
    pub fn with_analytics(mut self, analytics: Analytics) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// With accessibility metadata
    #[inline]
    #[must_use]
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = Some(accessibility);
        self
    }

    /// The variant tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = 6
            + usize::from(self.analytics.is_some())
            + usize::from(self.accessibility.is_some());
        let mut st = serializer.serialize_struct("Block", len)?;
        st.serialize_field("id", &self.id)?;
        st.serialize_field("key", &self.key)?;
        st.serialize_field("kind", &self.kind())?;
        st.serialize_field("order", &self.order)?;
        st.serialize_field("layout", &self.layout)?;
        match &self.analytics {
            Some(analytics) => st.serialize_field("analytics", analytics)?,
            None => st.skip_field("analytics")?,
        }
        match &self.accessibility {
            Some(accessibility) => st.serialize_field("accessibility", accessibility)?,
            None => st.skip_field("accessibility")?,
        }
        match &self.body {
            BlockBody::FilterBar(data) => st.serialize_field("data", data)?,
            BlockBody::HeroCarousel(data) => st.serialize_field("data", data)?,
            BlockBody::CollectionRail(data) => st.serialize_field("data", data)?,
            BlockBody::MapGrid(data) => st.serialize_field("data", data)?,
            BlockBody::PromoSlot(data) => st.serialize_field("data", data)?,
            BlockBody::ChatStarter(data) => st.serialize_field("data", data)?,
            BlockBody::SeoFragment(data) => st.serialize_field("data", data)?,
        }
        st.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BlockWire {
    id: Uuid,
    key: String,
    kind: BlockKind,
    order: u32,
    #[serde(default)]
    layout: Layout,
    #[serde(default)]
    analytics: Option<Analytics>,
    #[serde(default)]
    accessibility: Option<Accessibility>,
    data: Value,
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = BlockWire::deserialize(deserializer)?;
        let body = BlockBody::from_parts(wire.kind, wire.data).map_err(|e| {
            D::Error::custom(format!(
                "block `{}`: data does not match kind `{}`: {e}",
                wire.key, wire.kind
            ))
        })?;
        Ok(Block {
            id: wire.id,
            key: wire.key,
            order: wire.order,
            layout: wire.layout,
            analytics: wire.analytics,
            accessibility: wire.accessibility,
            body,
        })
    }
}
