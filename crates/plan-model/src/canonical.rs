//! Canonical form of a plan
//!
//! Two plans with the same meaning canonicalize to equal values, whatever
//! block order, dense-or-sparse `order` numbering, JSON key order or
//! cursor order they arrived in:
//!
//! 1. blocks sorted by `(order, key)`, then renumbered `0..n`
//! 2. every object inside free-form payload values key-sorted (arrays keep
//!    element order)
//! 3. `meta.cacheTags` sorted; `meta.flags` is a sorted map already
//! 4. `planCursors` sorted by `blockKey`
//!
//! Canonicalization is idempotent.

use serde_json::{Map, Value};

use crate::block::BlockBody;
use crate::plan::Plan;

/// Canonical copy of a plan
#[must_use]
pub fn canonicalize(plan: &Plan) -> Plan {
    into_canonical(plan.clone())
}

/// Canonicalize in place, taking ownership
#[must_use]
pub fn into_canonical(mut plan: Plan) -> Plan {
    // id breaks ties only for duplicate keys, which validation rejects
    plan.blocks.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.id.cmp(&b.id))
    });
    for (position, block) in plan.blocks.iter_mut().enumerate() {
        block.order = dense_order(position);
        canonicalize_body(&mut block.body);
    }

    plan.meta.cache_tags.sort();
    plan.plan_cursors.sort_by(|a, b| a.block_key.cmp(&b.block_key));
    plan
}

/// Whether `plan` is already its own canonical representative
#[must_use]
pub fn is_canonical(plan: &Plan) -> bool {
    canonicalize(plan) == *plan
}

/// Renumber `order` to array position without touching array order
pub fn renumber(plan: &mut Plan) {
    for (position, block) in plan.blocks.iter_mut().enumerate() {
        block.order = dense_order(position);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn dense_order(position: usize) -> u32 {
    // plans never approach u32::MAX blocks
    position as u32
}

fn canonicalize_body(body: &mut BlockBody) {
    match body {
        BlockBody::CollectionRail(rail) => sort_object_keys(&mut rail.source.query),
        BlockBody::SeoFragment(seo) => sort_value_keys(&mut seo.json_ld),
        BlockBody::FilterBar(_)
        | BlockBody::HeroCarousel(_)
        | BlockBody::MapGrid(_)
        | BlockBody::PromoSlot(_)
        | BlockBody::ChatStarter(_) => {}
    }
}

/// Recursively key-sort every object reachable from `value`
pub fn sort_value_keys(value: &mut Value) {
    match value {
        Value::Object(map) => sort_object_keys(map),
        Value::Array(items) => items.iter_mut().for_each(sort_value_keys),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Recursively key-sort an object
///
/// Rebuilds the map in key order so the result holds whether or not
/// `serde_json` keeps insertion order.
pub fn sort_object_keys(map: &mut Map<String, Value>) {
    let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, mut value) in entries {
        sort_value_keys(&mut value);
        map.insert(key, value);
    }
}
