//! postit client library: the note state manager, its REST store, and the
//! terminal front end's building blocks.

pub mod api_client;
pub mod config;
pub mod error;
mod events;
pub mod manager;
pub mod notifications;
pub mod repl;
pub mod session;
pub mod state;
pub mod telemetry;

pub use manager::{AddOutcome, LoadOutcome, ManagerOptions, NoteManager, NotesHandle, Reconciled};
pub use session::{SessionProvider, SessionState};
pub use state::{ComposerState, NoteCollection, NotesSnapshot};
