//! Deterministic default plan
//!
//! [`default_plan`] builds the starter plan a tenant gets before any
//! composer run. Every identifier is a literal constant, so the output
//! (and therefore its hash) depends only on the tenant id and timestamp.

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use uuid::Uuid;

use crate::block::{
    Accessibility, Analytics, Block, BlockBody, ChatStarterData, CollectionRailData,
    CollectionSource, Cta, Facet, FacetKind, FilterBarData, HeroCarouselData, LatLng, Layout,
    LayoutWidth, MapGridData, PromoSlotData, SeoFragmentData, Slide,
};
use crate::plan::{Cursor, Metadata, Plan, DEFAULT_LOCALE, SCHEMA_VERSION};
use crate::versioned::{ModelError, VersionedPlan};

/// Composer version recorded on seeded plans
pub const SEED_COMPOSER_VERSION: &str = "seed-1";

pub const DEFAULT_PLAN_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0001);

const FILTERS_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0101);
const HERO_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0102);
const RAIL_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0103);
const MAP_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0104);
const PROMO_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0105);
const CHAT_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0106);
const SEO_ID: Uuid = Uuid::from_u128(0x5e5d_0000_0000_4000_8000_0000_0000_0107);

/// Starter plan for `tenant_id`, stamped with `at`
///
/// # Errors
/// Returns [`ModelError::Invalid`] if `tenant_id` is empty
pub fn default_plan(tenant_id: &str, at: DateTime<Utc>) -> Result<VersionedPlan, ModelError> {
    let blocks = vec![
        filters(),
        hero(),
        rail(),
        map(),
        promo(),
        chat(),
        seo(tenant_id),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, block)| block.with_order(u32::try_from(i).unwrap_or(u32::MAX)))
    .collect();

    let plan = Plan {
        id: DEFAULT_PLAN_ID,
        tenant_id: tenant_id.to_string(),
        path: "/".to_string(),
        title: "Home".to_string(),
        description: Some("Default storefront plan".to_string()),
        updated_at: at,
        version: SCHEMA_VERSION.to_string(),
        blocks,
        meta: Metadata {
            plan_hash: None,
            composer_version: Some(SEED_COMPOSER_VERSION.to_string()),
            generated_at: Some(at),
            locale: DEFAULT_LOCALE.to_string(),
            cache_tags: vec![format!("tenant:{tenant_id}"), "plan:default".to_string()],
            flags: [("chat".to_string(), true), ("map".to_string(), true)]
                .into_iter()
                .collect(),
        },
        plan_cursors: vec![Cursor::new("featured", "")],
    };
    VersionedPlan::new(plan)
}

fn filters() -> Block {
    Block::new(
        FILTERS_ID,
        "filters",
        BlockBody::FilterBar(FilterBarData {
            facets: vec![
                Facet {
                    id: "category".to_string(),
                    label: "Category".to_string(),
                    kind: FacetKind::Select,
                    options: vec!["stays".to_string(), "experiences".to_string()],
                },
                Facet {
                    id: "price".to_string(),
                    label: "Price".to_string(),
                    kind: FacetKind::Range,
                    options: vec![],
                },
            ],
            sticky: true,
        }),
    )
    .with_layout(Layout {
        width: LayoutWidth::Full,
        columns: None,
        variant: Some("compact".to_string()),
    })
}

fn hero() -> Block {
    Block::new(
        HERO_ID,
        "hero",
        BlockBody::HeroCarousel(HeroCarouselData {
            slides: vec![Slide {
                id: "welcome".to_string(),
                title: "Find your next trip".to_string(),
                subtitle: None,
                image_url: "/assets/hero/welcome.jpg".to_string(),
                cta: Some(Cta {
                    label: "Explore".to_string(),
                    href: "/explore".to_string(),
                }),
            }],
            autoplay_ms: Some(6000),
        }),
    )
    .with_layout(Layout {
        width: LayoutWidth::Full,
        columns: None,
        variant: None,
    })
    .with_accessibility(Accessibility {
        label: Some("Featured destinations".to_string()),
        landmark: Some("banner".to_string()),
    })
}

fn rail() -> Block {
    let mut query = Map::new();
    query.insert("sort".to_string(), json!("popular"));
    query.insert("window".to_string(), json!({ "days": 30 }));
    Block::new(
        RAIL_ID,
        "featured",
        BlockBody::CollectionRail(CollectionRailData {
            title: "Featured".to_string(),
            source: CollectionSource {
                collection_id: "featured".to_string(),
                query,
            },
            limit: 12,
            streaming: true,
        }),
    )
    .with_analytics(Analytics {
        event_prefix: "rail.featured".to_string(),
        tags: std::collections::BTreeMap::new(),
    })
}

fn map() -> Block {
    Block::new(
        MAP_ID,
        "map",
        BlockBody::MapGrid(MapGridData {
            center: LatLng { lat: 0.0, lng: 0.0 },
            zoom: 2,
            listing_ids: vec![],
        }),
    )
}

fn promo() -> Block {
    Block::new(
        PROMO_ID,
        "promo",
        BlockBody::PromoSlot(PromoSlotData {
            placement: "inline".to_string(),
            campaign_id: None,
            fallback: Some(Cta {
                label: "See offers".to_string(),
                href: "/offers".to_string(),
            }),
        }),
    )
}

fn chat() -> Block {
    Block::new(
        CHAT_ID,
        "chat",
        BlockBody::ChatStarter(ChatStarterData {
            prompt: "Where do you want to go?".to_string(),
            suggestions: vec!["A beach weekend".to_string(), "A city break".to_string()],
            persona: None,
        }),
    )
    .with_layout(Layout {
        width: LayoutWidth::Narrow,
        columns: None,
        variant: None,
    })
}

fn seo(tenant_id: &str) -> Block {
    Block::new(
        SEO_ID,
        "seo",
        BlockBody::SeoFragment(SeoFragmentData {
            title: "Home".to_string(),
            description: "Default storefront plan".to_string(),
            json_ld: json!({
                "@type": "WebSite",
                "@context": "https://schema.org",
                "name": tenant_id,
            }),
        }),
    )
}
