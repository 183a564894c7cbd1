//! Messages flowing into the note manager actor.

use postit_core::{Note, NoteId, NotesResult, OwnerId, StoreResult};
use tokio::sync::oneshot;

use crate::manager::{AddOutcome, LoadOutcome, Reconciled};

pub(crate) type Reply<T> = oneshot::Sender<NotesResult<T>>;

/// Commands issued through a [`crate::manager::NotesHandle`].
#[derive(Debug)]
pub(crate) enum Command {
    Load {
        owner_id: OwnerId,
        reply: Reply<LoadOutcome>,
    },
    Add {
        owner_id: OwnerId,
        text: String,
        reply: Reply<AddOutcome>,
    },
    Edit {
        note_id: NoteId,
        text: String,
        reply: Reply<Reconciled>,
    },
    Delete {
        note_id: NoteId,
        reply: Reply<Reconciled>,
    },
    OpenComposer {
        reply: Reply<()>,
    },
    SetDraft {
        text: String,
        reply: Reply<()>,
    },
    CloseComposer {
        reply: Reply<()>,
    },
    SubmitDraft {
        reply: Reply<AddOutcome>,
    },
    DismissNotifications {
        reply: Reply<()>,
    },
    /// Clear retryable alerts and name the owner whose load should be re-run.
    TakeRetry {
        reply: Reply<Option<OwnerId>>,
    },
}

/// Outcome of a store call, sent back to the actor by the task that ran it.
///
/// `epoch` is the session epoch the call was issued under.
#[derive(Debug)]
pub(crate) enum Completion {
    Listed {
        seq: u64,
        epoch: u64,
        owner_id: OwnerId,
        result: StoreResult<Vec<Note>>,
        reply: Option<Reply<LoadOutcome>>,
    },
    Created {
        epoch: u64,
        from_draft: bool,
        result: StoreResult<Note>,
        reply: Reply<AddOutcome>,
    },
    Updated {
        epoch: u64,
        note_id: NoteId,
        result: StoreResult<Note>,
        reply: Reply<Reconciled>,
    },
    Deleted {
        epoch: u64,
        note_id: NoteId,
        result: StoreResult<()>,
        reply: Reply<Reconciled>,
    },
}
