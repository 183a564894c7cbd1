//! Postit Test Utilities
//!
//! Centralized test infrastructure for the postit workspace:
//! - Proptest generators for ids, notes and note collections
//! - Test fixtures for common scenarios
//! - Custom assertions for note-specific validation

// Re-export mock store from its source crate
pub use postit_store::{MockNoteStore, StoreGate, StoreOp};

// Re-export core types for convenience
pub use postit_core::{
    ErrorKind, Note, NoteId, NotesError, NotesResult, OwnerId, StoreError, StoreResult,
    ValidationError,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating note types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a NoteId in the store's `note-<n>` format.
    pub fn arb_note_id() -> impl Strategy<Value = NoteId> {
        (1u32..10_000).prop_map(|n| NoteId::new(format!("note-{}", n)))
    }

    /// Generate a non-empty owner id.
    pub fn arb_owner_id() -> impl Strategy<Value = OwnerId> {
        "[a-z][a-z0-9]{2,11}".prop_map(|raw| {
            OwnerId::parse(&raw).unwrap_or_else(|_| unreachable!("pattern is never blank"))
        })
    }

    /// Generate note text with at least one visible character.
    pub fn arb_note_text() -> impl Strategy<Value = String> {
        "[ ]{0,2}[A-Za-z0-9][A-Za-z0-9 .,!?]{0,40}"
    }

    /// Generate text that fails validation (empty or whitespace only).
    pub fn arb_blank_text() -> impl Strategy<Value = String> {
        "[ \t\n]{0,6}"
    }

    /// Generate a note owned by `owner`.
    pub fn arb_note_for(owner: OwnerId) -> impl Strategy<Value = Note> {
        (arb_note_id(), arb_note_text())
            .prop_map(move |(id, text)| Note::new(id, owner.clone(), text))
    }

    /// Generate notes for `owner` with pairwise distinct ids.
    pub fn arb_unique_notes_for(
        owner: OwnerId,
        max: usize,
    ) -> impl Strategy<Value = Vec<Note>> {
        prop::collection::btree_set(1u32..10_000, 0..=max).prop_flat_map(move |ids| {
            let owner = owner.clone();
            let count = ids.len();
            prop::collection::vec(arb_note_text(), count).prop_map(move |texts| {
                ids.iter()
                    .zip(texts)
                    .map(|(n, text)| {
                        Note::new(NoteId::new(format!("note-{}", n)), owner.clone(), text)
                    })
                    .collect()
            })
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Owner id for the default test session.
    pub fn test_owner() -> OwnerId {
        owner("user-1")
    }

    /// Parse an owner id known to be valid.
    pub fn owner(raw: &str) -> OwnerId {
        OwnerId::parse(raw).unwrap_or_else(|err| panic!("invalid fixture owner {raw:?}: {err}"))
    }

    /// Build a note with an explicit id.
    pub fn note(id: &str, owner_id: &OwnerId, text: &str) -> Note {
        Note::new(NoteId::new(id), owner_id.clone(), text)
    }

    /// Store seeded with `[{id:1,text:"A"},{id:2,text:"B"}]` for `owner_id`.
    pub fn seeded_store(owner_id: &OwnerId) -> MockNoteStore {
        let store = MockNoteStore::new();
        store.seed(note("1", owner_id, "A"));
        store.seed(note("2", owner_id, "B"));
        store
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for note-specific validation.

    use super::*;
    use std::collections::HashSet;

    /// Assert that a NotesResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &NotesResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a NotesResult failed with an error of `kind`.
    #[track_caller]
    pub fn assert_error_kind<T: std::fmt::Debug>(result: &NotesResult<T>, kind: ErrorKind) {
        match result {
            Err(err) if err.kind() == kind => {}
            other => panic!("Expected {:?} error, got: {:?}", kind, other),
        }
    }

    /// Assert that no two notes share an id.
    #[track_caller]
    pub fn assert_unique_ids(notes: &[Note]) {
        let mut seen = HashSet::new();
        for note in notes {
            assert!(seen.insert(&note.id), "Duplicate note id {}", note.id);
        }
    }

    /// Assert that every note belongs to `owner_id`.
    #[track_caller]
    pub fn assert_owned_by(notes: &[Note], owner_id: &OwnerId) {
        for note in notes {
            assert_eq!(
                &note.owner_id, owner_id,
                "Note {} belongs to {}, expected {}",
                note.id, note.owner_id, owner_id
            );
        }
    }

    /// Assert the `(id, text)` pairs of a note list, in order.
    #[track_caller]
    pub fn assert_id_texts(notes: &[Note], expected: &[(&str, &str)]) {
        let actual: Vec<(&str, &str)> = notes
            .iter()
            .map(|n| (n.id.as_str(), n.text.as_str()))
            .collect();
        assert_eq!(actual, expected);
    }
}
