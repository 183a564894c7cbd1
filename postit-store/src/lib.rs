//! Postit Store - Note Store Trait and Mock Implementation
//!
//! Defines the contract the note state manager needs from a remote note
//! store. The HTTP implementation lives in postit-client.

pub mod mock;

pub use mock::{MockNoteStore, StoreGate, StoreOp};

use async_trait::async_trait;
use postit_core::{Note, NoteId, OwnerId, StoreResult};
use std::sync::Arc;

/// CRUD access to persisted notes.
///
/// Every call is one round-trip and reports either the resulting record or a
/// typed [`postit_core::StoreError`]. No batching, paging or streaming.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List all notes of an owner, in store order.
    async fn list(&self, owner_id: &OwnerId) -> StoreResult<Vec<Note>>;

    /// Create a note; the store assigns its id.
    async fn create(&self, owner_id: &OwnerId, text: &str) -> StoreResult<Note>;

    /// Replace the text of an existing note.
    async fn update(&self, note_id: &NoteId, text: &str) -> StoreResult<Note>;

    /// Delete a note.
    async fn delete(&self, note_id: &NoteId) -> StoreResult<()>;
}

#[async_trait]
impl<T: NoteStore + ?Sized> NoteStore for Arc<T> {
    async fn list(&self, owner_id: &OwnerId) -> StoreResult<Vec<Note>> {
        (**self).list(owner_id).await
    }

    async fn create(&self, owner_id: &OwnerId, text: &str) -> StoreResult<Note> {
        (**self).create(owner_id, text).await
    }

    async fn update(&self, note_id: &NoteId, text: &str) -> StoreResult<Note> {
        (**self).update(note_id, text).await
    }

    async fn delete(&self, note_id: &NoteId) -> StoreResult<()> {
        (**self).delete(note_id).await
    }
}
