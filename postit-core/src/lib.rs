//! Postit Core - Note Types
//!
//! Pure data structures shared by every other crate: identities, the note
//! record, and the error taxonomy for note operations.

pub mod error;
pub mod identity;
pub mod note;

pub use error::{
    ErrorKind, NotesError, NotesResult, StoreError, StoreResult, ValidationError,
};
pub use identity::{NoteId, OwnerId, Timestamp};
pub use note::{validate_note_text, Note};
