//! Functional tests for compare-and-swap editing against a shared store.
//!
//! Core guarantees exercised here:
//! - Of several writers holding the same hash, exactly one write succeeds.
//! - Losing writers learn the winner's hash from the rejection itself.
//! - A conflicted session discards its local edit and adopts the store state.
//! - A second conflict on a later save is reported again, not retried.

use std::sync::Arc;

use plan_model::PlanEdit;
use plan_sync::{
    EditSession, MemoryPlanStore, PlanLocator, PlanTransport, SaveOutcome, SessionState,
    WriteError,
};
use plan_test_utils::{abc_plan, TENANT};
use pretty_assertions::assert_eq;

fn shared_store() -> (Arc<MemoryPlanStore>, PlanLocator) {
    let locator = PlanLocator::default_for(TENANT);
    let store = MemoryPlanStore::seeded(locator.clone(), abc_plan()).unwrap();
    (Arc::new(store), locator)
}

async fn session(
    store: &Arc<MemoryPlanStore>,
    locator: &PlanLocator,
) -> EditSession<Arc<MemoryPlanStore>> {
    EditSession::open(Arc::clone(store), locator.clone()).await.unwrap()
}

fn move_to(key: &str, to: usize) -> PlanEdit {
    PlanEdit::MoveBlock { key: key.into(), to }
}

/// Tenet: the two-editor walkthrough.
///
/// A reorders `[A,B,C]` to `[B,A,C]` and wins. B, still on H0, tries
/// `[A,C,B]`, is told the store is at H1, and ends up holding A's plan.
#[tokio::test]
async fn second_editor_loses_and_adopts_first_editors_plan() {
    let (store, locator) = shared_store();
    let first = session(&store, &locator).await;
    let second = session(&store, &locator).await;
    let h0 = first.reference_hash();
    assert_eq!(second.reference_hash(), h0);

    first.apply(&move_to("b", 0)).unwrap();
    let saved = first.save().await.unwrap();
    let SaveOutcome::Saved(h1_state) = saved else {
        panic!("first save must succeed");
    };
    let h1 = h1_state.hash;
    assert_ne!(h1, h0);
    assert_eq!(h1_state.plan.keys(), vec!["b", "a", "c"]);

    second.apply(&move_to("c", 1)).unwrap();
    assert_eq!(second.local_plan().keys(), vec!["a", "c", "b"]);
    let outcome = second.save().await.unwrap();

    let SaveOutcome::Conflicted(report) = outcome else {
        panic!("second save must conflict");
    };
    assert_eq!(report.stale_hash, h0);
    assert_eq!(report.current_hash, h1);
    assert_eq!(report.discarded.keys(), vec!["a", "c", "b"]);
    assert_eq!(second.reference(), store.current(&locator).unwrap());
    assert_eq!(second.reference_hash(), h1);
    assert_eq!(second.local_plan().keys(), vec!["b", "a", "c"]);
    assert_eq!(second.state(), SessionState::Idle);
    assert_eq!(store.write_count(), 1);
}

/// Tenet: CAS exclusivity under real concurrency.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_of_many_writers_wins() {
    let (store, locator) = shared_store();
    let base = store.current(&locator).unwrap();

    let mut handles = Vec::new();
    for to in 0..8usize {
        let store = Arc::clone(&store);
        let locator = locator.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            let mut candidate = base.plan.clone();
            candidate.title = format!("Edit {to}");
            store.write_if_match(&locator, &candidate, &base.hash).await
        }));
    }

    let mut winners = Vec::new();
    let mut losers = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(stored) => winners.push(stored),
            Err(WriteError::Conflict { current_hash }) => losers.push(current_hash),
            Err(other) => panic!("unexpected write error: {other}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers.len(), 7);
    let winner = &winners[0];
    assert!(losers.iter().all(|hash| *hash == winner.hash));
    assert_eq!(store.current(&locator).unwrap(), *winner);
}

/// Tenet: conflicts are not retried behind the caller's back.
///
/// After a conflict the session holds the fresh reference, so redoing the
/// edit succeeds. If the store moves again in between, the redo conflicts
/// again and is reported as a fresh conflict.
#[tokio::test]
async fn redo_after_conflict_can_conflict_again() {
    let (store, locator) = shared_store();
    let editor = session(&store, &locator).await;
    let racer = session(&store, &locator).await;

    racer.apply(&PlanEdit::SetTitle("Racer 1".into())).unwrap();
    assert!(racer.save().await.unwrap().is_saved());

    editor.apply(&move_to("c", 0)).unwrap();
    assert!(!editor.save().await.unwrap().is_saved());

    racer.apply(&PlanEdit::SetTitle("Racer 2".into())).unwrap();
    assert!(racer.save().await.unwrap().is_saved());

    editor.apply(&move_to("c", 0)).unwrap();
    let SaveOutcome::Conflicted(report) = editor.save().await.unwrap() else {
        panic!("stale redo must conflict");
    };
    assert_eq!(report.current_hash, racer.reference_hash());
    assert_eq!(editor.reference().plan.title, "Racer 2");
    assert_eq!(store.write_count(), 2);

    editor.apply(&move_to("c", 0)).unwrap();
    let saved = editor.save().await.unwrap();
    assert!(saved.is_saved());
    assert_eq!(saved.reference().plan.keys(), vec!["c", "a", "b"]);
    assert_eq!(saved.reference().plan.title, "Racer 2");
}

/// Tenet: reverting an edit before saving leaves nothing to write.
#[tokio::test]
async fn reverted_edit_has_nothing_to_save() {
    let (store, locator) = shared_store();
    let editor = session(&store, &locator).await;
    editor.apply(&move_to("a", 2)).unwrap();
    editor.apply(&move_to("a", 0)).unwrap();

    let err = editor.save().await.unwrap_err();
    assert!(matches!(err, plan_sync::SessionError::NothingToSave));
    assert_eq!(store.write_count(), 0);
}

/// Tenet: refresh picks up foreign writes without a save.
#[tokio::test]
async fn refresh_adopts_foreign_write() {
    let (store, locator) = shared_store();
    let reader = session(&store, &locator).await;
    let writer = session(&store, &locator).await;
    reader.apply(&move_to("b", 2)).unwrap();

    writer.apply(&PlanEdit::RemoveBlock { key: "c".into() }).unwrap();
    writer.save().await.unwrap();

    let fresh = reader.refresh().await.unwrap();
    assert_eq!(fresh.plan.keys(), vec!["a", "b"]);
    assert!(!reader.is_dirty());
    assert_eq!(reader.reference_hash(), writer.reference_hash());
}
