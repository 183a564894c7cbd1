//! The note record and text validation.

use crate::error::ValidationError;
use crate::identity::{NoteId, OwnerId, Timestamp};
use serde::{Deserialize, Serialize};

/// A single persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub text: String,
    /// Creation time as reported by the store. Never used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Note {
    pub fn new(id: NoteId, owner_id: OwnerId, text: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            text: text.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Check that note text has visible content.
///
/// The text is returned as typed; trimming only decides emptiness.
pub fn validate_note_text(text: &str) -> Result<&str, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(text)
}
