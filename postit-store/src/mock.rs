//! In-memory note store.
//!
//! Keeps notes in insertion order and assigns ids from a counter. Besides
//! plain CRUD it supports the two hooks tests need to drive the state
//! manager through failure and reordering:
//!
//! - [`MockNoteStore::fail_next`] queues an error for the next call of an
//!   operation. The failing call leaves the data untouched.
//! - [`MockNoteStore::hold_next`] makes the next call of an operation compute
//!   its result right away, then wait for [`StoreGate::release`] before
//!   returning it.

use crate::NoteStore;
use async_trait::async_trait;
use chrono::Utc;
use postit_core::{Note, NoteId, OwnerId, StoreError, StoreResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// The four store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

/// Handle that releases a held store call.
///
/// Dropping the gate without calling [`StoreGate::release`] also lets the
/// call complete.
#[derive(Debug)]
pub struct StoreGate {
    sender: oneshot::Sender<()>,
}

impl StoreGate {
    pub fn release(self) {
        let _ = self.sender.send(());
    }
}

#[derive(Debug, Default)]
struct MockState {
    notes: Vec<Note>,
    next_id: u64,
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
    gates: HashMap<StoreOp, VecDeque<oneshot::Receiver<()>>>,
    calls: HashMap<StoreOp, usize>,
}

impl MockState {
    /// Register a call and pick up any queued failure and gate for it.
    fn begin(&mut self, op: StoreOp) -> (Option<StoreError>, Option<oneshot::Receiver<()>>) {
        *self.calls.entry(op).or_insert(0) += 1;
        let failure = self.failures.get_mut(&op).and_then(VecDeque::pop_front);
        let gate = self.gates.get_mut(&op).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    fn allocate_id(&mut self) -> NoteId {
        self.next_id += 1;
        NoteId::new(format!("note-{}", self.next_id))
    }
}

/// In-memory note store for testing and offline use.
#[derive(Debug, Clone, Default)]
pub struct MockNoteStore {
    state: Arc<Mutex<MockState>>,
}

impl MockNoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a record with a caller-chosen id, bypassing id assignment.
    ///
    /// Seeded ids must not collide with the `note-<n>` ids the store assigns.
    pub fn seed(&self, note: Note) {
        self.lock().notes.push(note);
    }

    /// Snapshot of every stored record, all owners, in insertion order.
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    /// Get count of stored notes.
    pub fn note_count(&self) -> usize {
        self.lock().notes.len()
    }

    /// Number of calls issued for an operation so far.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Hold the next call of `op` until the returned gate is released.
    pub fn hold_next(&self, op: StoreOp) -> StoreGate {
        let (sender, receiver) = oneshot::channel();
        self.lock().gates.entry(op).or_default().push_back(receiver);
        StoreGate { sender }
    }

    /// Remove all records, queued failures and gates.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.notes.clear();
        state.failures.clear();
        state.gates.clear();
    }
}

async fn wait_for(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

#[async_trait]
impl NoteStore for MockNoteStore {
    async fn list(&self, owner_id: &OwnerId) -> StoreResult<Vec<Note>> {
        let (result, gate) = {
            let mut state = self.lock();
            let (failure, gate) = state.begin(StoreOp::List);
            let result = match failure {
                Some(err) => Err(err),
                None => Ok(state
                    .notes
                    .iter()
                    .filter(|n| &n.owner_id == owner_id)
                    .cloned()
                    .collect()),
            };
            (result, gate)
        };
        tracing::trace!(owner_id = %owner_id, ok = result.is_ok(), "mock store list");
        wait_for(gate).await;
        result
    }

    async fn create(&self, owner_id: &OwnerId, text: &str) -> StoreResult<Note> {
        let (result, gate) = {
            let mut state = self.lock();
            let (failure, gate) = state.begin(StoreOp::Create);
            let result = match failure {
                Some(err) => Err(err),
                None => {
                    let id = state.allocate_id();
                    let note = Note::new(id, owner_id.clone(), text)
                        .with_created_at(Utc::now());
                    state.notes.push(note.clone());
                    Ok(note)
                }
            };
            (result, gate)
        };
        tracing::trace!(owner_id = %owner_id, ok = result.is_ok(), "mock store create");
        wait_for(gate).await;
        result
    }

    async fn update(&self, note_id: &NoteId, text: &str) -> StoreResult<Note> {
        let (result, gate) = {
            let mut state = self.lock();
            let (failure, gate) = state.begin(StoreOp::Update);
            let result = match failure {
                Some(err) => Err(err),
                None => match state.notes.iter_mut().find(|n| &n.id == note_id) {
                    Some(note) => {
                        note.text = text.to_string();
                        Ok(note.clone())
                    }
                    None => Err(StoreError::NotFound {
                        id: note_id.clone(),
                    }),
                },
            };
            (result, gate)
        };
        tracing::trace!(note_id = %note_id, ok = result.is_ok(), "mock store update");
        wait_for(gate).await;
        result
    }

    async fn delete(&self, note_id: &NoteId) -> StoreResult<()> {
        let (result, gate) = {
            let mut state = self.lock();
            let (failure, gate) = state.begin(StoreOp::Delete);
            let result = match failure {
                Some(err) => Err(err),
                None => match state.notes.iter().position(|n| &n.id == note_id) {
                    Some(index) => {
                        state.notes.remove(index);
                        Ok(())
                    }
                    None => Err(StoreError::NotFound {
                        id: note_id.clone(),
                    }),
                },
            };
            (result, gate)
        };
        tracing::trace!(note_id = %note_id, ok = result.is_ok(), "mock store delete");
        wait_for(gate).await;
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(id: &str) -> OwnerId {
        OwnerId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MockNoteStore::new();
        let a = store.create(&owner("u1"), "A").await.unwrap();
        let b = store.create(&owner("u1"), "B").await.unwrap();

        assert_eq!(a.id, NoteId::new("note-1"));
        assert_eq!(b.id, NoteId::new("note-2"));
        assert!(a.created_at.is_some());
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_keeps_order() {
        let store = MockNoteStore::new();
        store.create(&owner("u1"), "first").await.unwrap();
        store.create(&owner("u2"), "other").await.unwrap();
        store.create(&owner("u1"), "second").await.unwrap();

        let notes = store.list(&owner("u1")).await.unwrap();
        let texts: Vec<_> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MockNoteStore::new();
        let err = store.update(&NoteId::new("missing"), "x").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                id: NoteId::new("missing")
            }
        );
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = MockNoteStore::new();
        let note = store.create(&owner("u1"), "A").await.unwrap();
        store.delete(&note.id).await.unwrap();
        assert_eq!(store.note_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_next_applies_once_without_touching_data() {
        let store = MockNoteStore::new();
        store.fail_next(StoreOp::Create, StoreError::Unavailable);

        let err = store.create(&owner("u1"), "A").await.unwrap_err();
        assert_eq!(err, StoreError::Unavailable);
        assert_eq!(store.note_count(), 0);

        store.create(&owner("u1"), "A").await.unwrap();
        assert_eq!(store.note_count(), 1);
        assert_eq!(store.calls(StoreOp::Create), 2);
    }

    #[tokio::test]
    async fn test_hold_next_snapshots_at_issue_time() {
        let store = MockNoteStore::new();
        store.create(&owner("u1"), "A").await.unwrap();
        let gate = store.hold_next(StoreOp::List);

        let held = {
            let store = store.clone();
            tokio::spawn(async move { store.list(&owner("u1")).await })
        };
        while store.calls(StoreOp::List) == 0 {
            tokio::task::yield_now().await;
        }

        store.create(&owner("u1"), "B").await.unwrap();
        gate.release();

        let notes = held.await.unwrap().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "A");
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store = Arc::new(MockNoteStore::new());
        let shared: Arc<dyn NoteStore> = store.clone();
        shared.create(&owner("u1"), "A").await.unwrap();
        assert_eq!(store.note_count(), 1);
    }

    // ========================================================================
    // Property Tests
    // ========================================================================

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: assigned ids stay unique across creates and deletes
            #[test]
            fn prop_assigned_ids_unique(ops in prop::collection::vec(any::<bool>(), 1..30)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let store = MockNoteStore::new();
                rt.block_on(async {
                    for create in ops {
                        if create {
                            store.create(&owner("u1"), "text").await.unwrap();
                        } else if let Some(first) = store.notes().first() {
                            store.delete(&first.id).await.unwrap();
                        }
                    }
                });

                let notes = store.notes();
                let mut ids: Vec<_> = notes.iter().map(|n| n.id.clone()).collect();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), notes.len());
            }
        }
    }
}
