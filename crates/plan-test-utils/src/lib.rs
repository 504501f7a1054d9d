//! Testing utilities for the plan workspace
//!
//! Shared fixtures: block builders and the small plans used across tests.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use plan_model::{
    Block, BlockBody, ChatStarterData, CollectionRailData, CollectionSource, Plan, PromoSlotData,
    SeoFragmentData, VersionedPlan,
};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const TENANT: &str = "acme";

pub fn fixed_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-15T09:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Stable id derived from a block key
pub fn id_for(key: &str) -> Uuid {
    let mut n: u128 = 0xb10c_0000_0000_4000_8000_0000_0000_0000;
    for (i, byte) in key.bytes().enumerate() {
        n ^= u128::from(byte) << ((i % 12) * 8);
    }
    Uuid::from_u128(n)
}

pub fn chat_block(key: &str, prompt: &str) -> Block {
    Block::new(
        id_for(key),
        key,
        BlockBody::ChatStarter(ChatStarterData {
            prompt: prompt.to_string(),
            suggestions: vec![],
            persona: None,
        }),
    )
}

pub fn promo_block(key: &str, placement: &str) -> Block {
    Block::new(
        id_for(key),
        key,
        BlockBody::PromoSlot(PromoSlotData {
            placement: placement.to_string(),
            campaign_id: None,
            fallback: None,
        }),
    )
}

pub fn rail_block(key: &str, query: Map<String, Value>) -> Block {
    Block::new(
        id_for(key),
        key,
        BlockBody::CollectionRail(CollectionRailData {
            title: key.to_string(),
            source: CollectionSource {
                collection_id: key.to_string(),
                query,
            },
            limit: 8,
            streaming: true,
        }),
    )
}

pub fn seo_block(key: &str, json_ld: Value) -> Block {
    Block::new(
        id_for(key),
        key,
        BlockBody::SeoFragment(SeoFragmentData {
            title: "Title".to_string(),
            description: "Description".to_string(),
            json_ld,
        }),
    )
}

/// Plan holding `blocks` with `order` set to array position
pub fn plan_with_blocks(blocks: Vec<Block>) -> Plan {
    let mut plan = Plan::new(
        Uuid::from_u128(0x9a11_0000_0000_4000_8000_0000_0000_0001),
        TENANT,
        "/",
        "Home",
        fixed_time(),
    );
    plan.blocks = blocks
        .into_iter()
        .enumerate()
        .map(|(i, b)| b.with_order(u32::try_from(i).unwrap()))
        .collect();
    plan
}

/// Three chat blocks `a`, `b`, `c` in that order
pub fn abc_plan() -> Plan {
    plan_with_blocks(vec![
        chat_block("a", "first"),
        chat_block("b", "second"),
        chat_block("c", "third"),
    ])
}

pub fn versioned_abc() -> VersionedPlan {
    VersionedPlan::new(abc_plan()).unwrap()
}
