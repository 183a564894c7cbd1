//! Note collection and manager state definitions.

use crate::notifications::{Notification, NotificationAction};
use postit_core::{Note, NoteId, NotesError, OwnerId};

/// Oldest notifications are dropped beyond this many.
pub const MAX_NOTIFICATIONS: usize = 32;

/// Ordered notes of one owner, in fetch/insertion order.
///
/// Every note has the bound owner's id and no two notes share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    owner_id: Option<OwnerId>,
    notes: Vec<Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    /// Bind the collection to `owner_id`. Returns true when the owner
    /// changed, in which case all notes were dropped.
    pub fn bind(&mut self, owner_id: &OwnerId) -> bool {
        if self.owner_id.as_ref() == Some(owner_id) {
            return false;
        }
        self.notes.clear();
        self.owner_id = Some(owner_id.clone());
        true
    }

    /// Drop all notes and unbind the owner.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.owner_id = None;
    }

    /// Replace the contents with a fetched list, keeping its order.
    ///
    /// Notes of other owners and repeated ids are skipped. Returns the
    /// number of notes kept.
    pub fn replace_all(&mut self, notes: Vec<Note>) -> usize {
        self.notes.clear();
        for note in notes {
            if !self.accepts(&note) {
                tracing::warn!(note_id = %note.id, owner_id = %note.owner_id, "dropping note of another owner");
                continue;
            }
            if self.position(&note.id).is_some() {
                tracing::warn!(note_id = %note.id, "dropping duplicate note id from list");
                continue;
            }
            self.notes.push(note);
        }
        self.notes.len()
    }

    /// Append a note at the end. A note whose id is already present
    /// replaces the existing entry in place.
    ///
    /// Returns false, leaving the collection untouched, when the note belongs
    /// to another owner.
    pub fn append(&mut self, note: Note) -> bool {
        if !self.accepts(&note) {
            return false;
        }
        match self.position(&note.id) {
            Some(index) => {
                tracing::warn!(note_id = %note.id, "appended note already present, replacing");
                self.notes[index] = note;
            }
            None => self.notes.push(note),
        }
        true
    }

    /// Set the text of the note with `id`. Returns false if absent.
    pub fn update_text(&mut self, id: &NoteId, text: impl Into<String>) -> bool {
        match self.notes.iter_mut().find(|n| &n.id == id) {
            Some(note) => {
                note.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Remove the note with `id`. Returns false if absent.
    pub fn remove(&mut self, id: &NoteId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.notes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Note> {
        self.notes.clone()
    }

    fn accepts(&self, note: &Note) -> bool {
        self.owner_id.as_ref() == Some(&note.owner_id)
    }

    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|n| &n.id == id)
    }
}

/// The add-note composer: visibility and the text being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    pub open: bool,
    pub draft: String,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesSnapshot {
    pub owner_id: Option<OwnerId>,
    pub notes: Vec<Note>,
    pub loading: bool,
    pub error: Option<String>,
    /// Mutations issued but not yet reconciled.
    pub pending: usize,
    pub composer: ComposerState,
    pub notifications: Vec<Notification>,
}

impl NotesSnapshot {
    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }
}

/// State owned by the note manager.
#[derive(Debug, Clone, Default)]
pub struct NotesState {
    pub collection: NoteCollection,
    pub loading: bool,
    pub error: Option<String>,
    pub pending: usize,
    pub composer: ComposerState,
    pub notifications: Vec<Notification>,
}

impl NotesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> NotesSnapshot {
        NotesSnapshot {
            owner_id: self.collection.owner().cloned(),
            notes: self.collection.to_vec(),
            loading: self.loading,
            error: self.error.clone(),
            pending: self.pending,
            composer: self.composer.clone(),
            notifications: self.notifications.clone(),
        }
    }

    /// Record a failure as the current error and raise an alert for it.
    pub fn surface(&mut self, err: &NotesError, action: NotificationAction) {
        let message = err.to_string();
        self.error = Some(message.clone());
        self.push_notification(Notification::new(message, action));
    }

    /// Drop every retryable alert. Returns true if there was one.
    pub fn take_retry(&mut self) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.is_retryable());
        self.notifications.len() != before
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Forget everything tied to the previous owner and bind to `owner_id`.
    pub fn reset_for_owner(&mut self, owner_id: Option<&OwnerId>) {
        match owner_id {
            Some(owner_id) => {
                self.collection.clear();
                self.collection.bind(owner_id);
            }
            None => self.collection.clear(),
        }
        self.loading = false;
        self.error = None;
        self.pending = 0;
        self.composer = ComposerState::default();
        self.notifications.clear();
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use postit_test_utils::assertions::{assert_owned_by, assert_unique_ids};
    use postit_test_utils::fixtures;
    use postit_test_utils::generators::{arb_note_for, arb_note_id, arb_note_text, arb_owner_id};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Append(Note),
        Update(NoteId, String),
        Remove(NoteId),
        Replace(Vec<Note>),
        Rebind(OwnerId),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        let owner = fixtures::test_owner();
        prop_oneof![
            4 => arb_note_for(owner.clone()).prop_map(Op::Append),
            1 => arb_note_for(fixtures::owner("intruder")).prop_map(Op::Append),
            2 => (arb_note_id(), arb_note_text()).prop_map(|(id, text)| Op::Update(id, text)),
            2 => arb_note_id().prop_map(Op::Remove),
            1 => prop::collection::vec(arb_note_for(owner.clone()), 0..6).prop_map(Op::Replace),
            1 => arb_owner_id().prop_map(Op::Rebind),
        ]
    }

    proptest! {
        // ====================================================================
        // Property: ownership and uniqueness hold for any operation sequence
        // ====================================================================

        #[test]
        fn prop_invariants_hold(ops in prop::collection::vec(arb_op(), 0..40)) {
            let mut collection = NoteCollection::new();
            collection.bind(&fixtures::test_owner());

            for op in ops {
                match op {
                    Op::Append(note) => { collection.append(note); }
                    Op::Update(id, text) => { collection.update_text(&id, text); }
                    Op::Remove(id) => { collection.remove(&id); }
                    Op::Replace(notes) => { collection.replace_all(notes); }
                    Op::Rebind(owner) => { collection.bind(&owner); }
                }

                let notes = collection.to_vec();
                assert_unique_ids(&notes);
                if let Some(owner) = collection.owner() {
                    assert_owned_by(&notes, owner);
                }
            }
        }

        // ====================================================================
        // Property: editing one id never touches another note
        // ====================================================================

        #[test]
        fn prop_update_targets_single_note(
            notes in prop::collection::vec(arb_note_for(fixtures::test_owner()), 1..8),
            pick in any::<prop::sample::Index>(),
            text in arb_note_text(),
        ) {
            let mut collection = NoteCollection::new();
            collection.bind(&fixtures::test_owner());
            collection.replace_all(notes);
            let before = collection.to_vec();
            let target = before[pick.index(before.len())].id.clone();

            prop_assert!(collection.update_text(&target, text.clone()));

            let after = collection.to_vec();
            prop_assert_eq!(after.len(), before.len());
            for (old, new) in before.iter().zip(after.iter()) {
                prop_assert_eq!(&old.id, &new.id);
                if old.id == target {
                    prop_assert_eq!(&new.text, &text);
                } else {
                    prop_assert_eq!(old, new);
                }
            }
        }
    }
}
