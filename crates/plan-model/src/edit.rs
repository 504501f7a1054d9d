//! Local edits on a plan
//!
//! [`PlanEdit`] is a structural operation with meaning (move this block,
//! replace that payload), not a text patch. Applying an edit is pure: it
//! works on a canonical copy, leaves the input untouched, and returns a plan
//! whose `order` values match array position again.

use std::fmt::{self, Display, Formatter};

use crate::block::{Block, BlockBody, BlockKind, Layout};
use crate::canonical::{canonicalize, renumber};
use crate::plan::Plan;

/// One local mutation
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEdit {
    /// Move a block to a new position (0-based, in current order)
    MoveBlock { key: String, to: usize },

    /// Exchange the positions of two blocks
    SwapBlocks { a: String, b: String },

    /// Replace a block's payload with one of the same kind
    ReplaceData { key: String, body: BlockBody },

    /// Replace a block's presentation hints
    UpdateLayout { key: String, layout: Layout },

    /// Remove a block and its cursor
    RemoveBlock { key: String },

    /// Insert a new block at a position (0..=len)
    InsertBlock { block: Block, at: usize },

    SetTitle(String),

    SetDescription(Option<String>),

    SetFlag { name: String, value: bool },

    /// Add a cache tag; adding a present tag is a no-op
    AddCacheTag(String),

    RemoveCacheTag(String),
}

/// Why an edit could not be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no block with key `{0}`")]
    UnknownBlock(String),

    #[error("position {index} is out of range for {len} block(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Kind is fixed at creation
    #[error("block `{key}` is a {expected}, not a {actual}")]
    KindMismatch {
        key: String,
        expected: BlockKind,
        actual: BlockKind,
    },

    #[error("a block with key `{0}` already exists")]
    DuplicateKey(String),

    #[error("a block with id {0} already exists")]
    DuplicateId(uuid::Uuid),

    #[error("cache tag `{0}` is not present")]
    UnknownCacheTag(String),
}

impl PlanEdit {
    /// Apply to a copy of `plan`
    ///
    /// # Errors
    /// Returns error if the edit does not fit the plan; `plan` is unchanged
    pub fn apply(&self, plan: &Plan) -> Result<Plan, EditError> {
        let mut next = canonicalize(plan);
        self.apply_in_place(&mut next)?;
        renumber(&mut next);
        Ok(next)
    }

    fn apply_in_place(&self, plan: &mut Plan) -> Result<(), EditError> {
        match self {
            PlanEdit::MoveBlock { key, to } => {
                let from = position(plan, key)?;
                if *to >= plan.blocks.len() {
                    return Err(EditError::IndexOutOfRange {
                        index: *to,
                        len: plan.blocks.len(),
                    });
                }
                let block = plan.blocks.remove(from);
                plan.blocks.insert(*to, block);
            }
            PlanEdit::SwapBlocks { a, b } => {
                let i = position(plan, a)?;
                let j = position(plan, b)?;
                plan.blocks.swap(i, j);
            }
            PlanEdit::ReplaceData { key, body } => {
                let i = position(plan, key)?;
                let block = &mut plan.blocks[i];
                if block.kind() != body.kind() {
                    return Err(EditError::KindMismatch {
                        key: key.clone(),
                        expected: block.kind(),
                        actual: body.kind(),
                    });
                }
                block.body = body.clone();
            }
            PlanEdit::UpdateLayout { key, layout } => {
                let i = position(plan, key)?;
                plan.blocks[i].layout = layout.clone();
            }
            PlanEdit::RemoveBlock { key } => {
                let i = position(plan, key)?;
                plan.blocks.remove(i);
                plan.plan_cursors.retain(|c| c.block_key != *key);
            }
            PlanEdit::InsertBlock { block, at } => {
                if *at > plan.blocks.len() {
                    return Err(EditError::IndexOutOfRange {
                        index: *at,
                        len: plan.blocks.len(),
                    });
                }
                if plan.block(&block.key).is_some() {
                    return Err(EditError::DuplicateKey(block.key.clone()));
                }
                if plan.blocks.iter().any(|b| b.id == block.id) {
                    return Err(EditError::DuplicateId(block.id));
                }
                plan.blocks.insert(*at, block.clone());
            }
            PlanEdit::SetTitle(title) => plan.title.clone_from(title),
            PlanEdit::SetDescription(description) => plan.description.clone_from(description),
            PlanEdit::SetFlag { name, value } => {
                plan.meta.flags.insert(name.clone(), *value);
            }
            PlanEdit::AddCacheTag(tag) => {
                if !plan.meta.cache_tags.contains(tag) {
                    plan.meta.cache_tags.push(tag.clone());
                    plan.meta.cache_tags.sort();
                }
            }
            PlanEdit::RemoveCacheTag(tag) => {
                let before = plan.meta.cache_tags.len();
                plan.meta.cache_tags.retain(|t| t != tag);
                if plan.meta.cache_tags.len() == before {
                    return Err(EditError::UnknownCacheTag(tag.clone()));
                }
            }
        }
        Ok(())
    }
}

fn position(plan: &Plan, key: &str) -> Result<usize, EditError> {
    plan.position(key)
        .ok_or_else(|| EditError::UnknownBlock(key.to_string()))
}

impl Display for PlanEdit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PlanEdit::MoveBlock { key, to } => write!(f, "move `{key}` to {to}"),
            PlanEdit::SwapBlocks { a, b } => write!(f, "swap `{a}` and `{b}`"),
            PlanEdit::ReplaceData { key, body } => {
                write!(f, "replace {} data of `{key}`", body.kind())
            }
            PlanEdit::UpdateLayout { key, .. } => write!(f, "update layout of `{key}`"),
            PlanEdit::RemoveBlock { key } => write!(f, "remove `{key}`"),
            PlanEdit::InsertBlock { block, at } => {
                write!(f, "insert {} `{}` at {at}", block.kind(), block.key)
            }
            PlanEdit::SetTitle(_) => f.write_str("set title"),
            PlanEdit::SetDescription(_) => f.write_str("set description"),
            PlanEdit::SetFlag { name, value } => write!(f, "set flag `{name}` = {value}"),
            PlanEdit::AddCacheTag(tag) => write!(f, "add cache tag `{tag}`"),
            PlanEdit::RemoveCacheTag(tag) => write!(f, "remove cache tag `{tag}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ChatStarterData, LayoutWidth, PromoSlotData};
    use crate::plan::Cursor;
    use uuid::Uuid;

    fn chat(id: u128, key: &str) -> Block {
        Block::new(
            Uuid::from_u128(id),
            key,
            BlockBody::ChatStarter(ChatStarterData {
                prompt: key.to_string(),
                suggestions: vec![],
                persona: None,
            }),
        )
    }

    fn abc() -> Plan {
        let mut plan = Plan::new(
            Uuid::from_u128(1),
            "acme",
            "/",
            "Home",
            "2026-01-02T03:04:05Z".parse().unwrap(),
        );
        plan.blocks = vec![
            chat(10, "a").with_order(0),
            chat(11, "b").with_order(1),
            chat(12, "c").with_order(2),
        ];
        plan
    }

    fn orders(plan: &Plan) -> Vec<u32> {
        plan.blocks.iter().map(|b| b.order).collect()
    }

    #[test]
    fn move_block_reorders_and_densifies() {
        let plan = abc();
        let moved = PlanEdit::MoveBlock { key: "c".into(), to: 0 }.apply(&plan).unwrap();
        assert_eq!(moved.keys(), vec!["c", "a", "b"]);
        assert_eq!(orders(&moved), vec![0, 1, 2]);
        assert_eq!(plan.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_block_out_of_range() {
        let err = PlanEdit::MoveBlock { key: "a".into(), to: 3 }
            .apply(&abc())
            .unwrap_err();
        assert_eq!(err, EditError::IndexOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn swap_blocks() {
        let swapped = PlanEdit::SwapBlocks { a: "a".into(), b: "b".into() }
            .apply(&abc())
            .unwrap();
        assert_eq!(swapped.keys(), vec!["b", "a", "c"]);
        assert_eq!(swapped.block("b").unwrap().id, Uuid::from_u128(11));
    }

    #[test]
    fn edits_use_presentation_order() {
        let mut plan = abc();
        plan.blocks.reverse();
        let moved = PlanEdit::MoveBlock { key: "a".into(), to: 2 }.apply(&plan).unwrap();
        assert_eq!(moved.keys(), vec!["b", "c", "a"]);
    }

    #[test]
    fn replace_data_keeps_kind() {
        let body = BlockBody::ChatStarter(ChatStarterData {
            prompt: "new".into(),
            suggestions: vec!["x".into()],
            persona: None,
        });
        let edited = PlanEdit::ReplaceData { key: "b".into(), body: body.clone() }
            .apply(&abc())
            .unwrap();
        assert_eq!(edited.block("b").unwrap().body, body);

        let other = BlockBody::PromoSlot(PromoSlotData {
            placement: "top".into(),
            campaign_id: None,
            fallback: None,
        });
        let err = PlanEdit::ReplaceData { key: "b".into(), body: other }
            .apply(&abc())
            .unwrap_err();
        assert!(matches!(err, EditError::KindMismatch { expected: BlockKind::ChatStarter, .. }));
    }

    #[test]
    fn update_layout() {
        let layout = Layout {
            width: LayoutWidth::Full,
            columns: Some(2),
            variant: None,
        };
        let edited = PlanEdit::UpdateLayout { key: "a".into(), layout: layout.clone() }
            .apply(&abc())
            .unwrap();
        assert_eq!(edited.block("a").unwrap().layout, layout);
    }

    #[test]
    fn remove_block_drops_cursor() {
        let mut plan = abc();
        plan.plan_cursors.push(Cursor::new("b", "p2"));
        let edited = PlanEdit::RemoveBlock { key: "b".into() }.apply(&plan).unwrap();
        assert_eq!(edited.keys(), vec!["a", "c"]);
        assert!(edited.plan_cursors.is_empty());
        assert_eq!(orders(&edited), vec![0, 1]);
    }

    #[test]
    fn insert_block_checks_identity() {
        let inserted = PlanEdit::InsertBlock { block: chat(13, "d"), at: 1 }
            .apply(&abc())
            .unwrap();
        assert_eq!(inserted.keys(), vec!["a", "d", "b", "c"]);

        let dup_key = PlanEdit::InsertBlock { block: chat(14, "a"), at: 0 }.apply(&abc());
        assert_eq!(dup_key.unwrap_err(), EditError::DuplicateKey("a".into()));

        let dup_id = PlanEdit::InsertBlock { block: chat(10, "e"), at: 0 }.apply(&abc());
        assert_eq!(dup_id.unwrap_err(), EditError::DuplicateId(Uuid::from_u128(10)));

        let far = PlanEdit::InsertBlock { block: chat(15, "f"), at: 9 }.apply(&abc());
        assert!(matches!(far, Err(EditError::IndexOutOfRange { index: 9, len: 3 })));
    }

    #[test]
    fn unknown_block_is_reported() {
        let err = PlanEdit::RemoveBlock { key: "zzz".into() }.apply(&abc()).unwrap_err();
        assert_eq!(err.to_string(), "no block with key `zzz`");
    }

    #[test]
    fn metadata_edits() {
        let plan = PlanEdit::SetFlag { name: "beta".into(), value: true }
            .apply(&abc())
            .unwrap();
        assert_eq!(plan.meta.flags.get("beta"), Some(&true));

        let plan = PlanEdit::AddCacheTag("home".into()).apply(&plan).unwrap();
        let plan = PlanEdit::AddCacheTag("home".into()).apply(&plan).unwrap();
        assert_eq!(plan.meta.cache_tags, vec!["home"]);

        let plan = PlanEdit::RemoveCacheTag("home".into()).apply(&plan).unwrap();
        assert!(plan.meta.cache_tags.is_empty());
        assert_eq!(
            PlanEdit::RemoveCacheTag("home".into()).apply(&plan).unwrap_err(),
            EditError::UnknownCacheTag("home".into())
        );

        let plan = PlanEdit::SetTitle("Landing".into()).apply(&plan).unwrap();
        let plan = PlanEdit::SetDescription(Some("Spring".into())).apply(&plan).unwrap();
        assert_eq!(plan.title, "Landing");
        assert_eq!(plan.description.as_deref(), Some("Spring"));
    }

    #[test]
    fn display_describes_edit() {
        let edit = PlanEdit::MoveBlock { key: "hero".into(), to: 2 };
        assert_eq!(edit.to_string(), "move `hero` to 2");
    }
}
