//! Error types for note operations

use crate::identity::{NoteId, OwnerId};
use thiserror::Error;

/// Local precondition failures. These never reach the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Note text cannot be empty")]
    EmptyText,

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Owner mismatch: session belongs to {expected}, got {got}")]
    OwnerMismatch { expected: OwnerId, got: OwnerId },
}

/// Failures reported by a note store call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Note not found: {id}")]
    NotFound { id: NoteId },

    #[error("Store did not respond within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Invalid response from store: {reason}")]
    InvalidResponse { reason: String },

    #[error("Store unavailable")]
    Unavailable,
}

/// Coarse classification of a [`NotesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Remote,
    Session,
    Internal,
}

/// Master error type for note state operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotesError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Remote(#[from] StoreError),

    #[error("No active session")]
    NoSession,

    #[error("Note manager has stopped")]
    ManagerStopped,
}

impl NotesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotesError::Validation(_) => ErrorKind::Validation,
            NotesError::Remote(_) => ErrorKind::Remote,
            NotesError::NoSession => ErrorKind::Session,
            NotesError::ManagerStopped => ErrorKind::Internal,
        }
    }

    /// Whether this failure is shown to the user.
    ///
    /// Validation and remote failures are surfaced; session gating and a
    /// stopped manager are reported to the caller only.
    pub fn is_surfaced(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Remote)
    }
}

/// Result of a single store call.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for note state operations.
pub type NotesResult<T> = Result<T, NotesError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_empty_text() {
        assert_eq!(
            ValidationError::EmptyText.to_string(),
            "Note text cannot be empty"
        );
    }

    #[test]
    fn test_store_error_display_rejected() {
        let err = StoreError::Rejected {
            status: 500,
            message: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_notes_error_is_transparent_over_sources() {
        let err: NotesError = StoreError::NotFound {
            id: NoteId::new("n1"),
        }
        .into();
        assert_eq!(err.to_string(), "Note not found: n1");
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_error_kind_surfacing() {
        assert!(NotesError::from(ValidationError::EmptyText).is_surfaced());
        assert!(NotesError::from(StoreError::Unavailable).is_surfaced());
        assert!(!NotesError::NoSession.is_surfaced());
        assert!(!NotesError::ManagerStopped.is_surfaced());
    }
}
