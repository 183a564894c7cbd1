//! Note state manager.
//!
//! One actor task owns [`NotesState`]. Commands arrive over an mpsc channel,
//! every store call runs in its own task, and each call's outcome comes back
//! as a [`Completion`] that the actor applies in arrival order. The
//! presentation layer only ever sees [`NotesSnapshot`] values.
//!
//! Two counters keep late results from clobbering newer state:
//! - `latest_load` numbers every issued list call; only the newest one is
//!   applied.
//! - `epoch` changes whenever the session owner changes; completions issued
//!   under an older epoch are discarded.

use crate::config::ClientConfig;
use crate::events::{Command, Completion, Reply};
use crate::notifications::NotificationAction;
use crate::session::SessionState;
use crate::state::{NotesSnapshot, NotesState};
use postit_core::{
    validate_note_text, Note, NoteId, NotesError, NotesResult, OwnerId, StoreError, StoreResult,
    ValidationError,
};
use postit_store::NoteStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Result of a `load` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list replaced the collection.
    Applied { count: usize },
    /// A newer load was issued before this one completed; its result was
    /// discarded.
    Superseded,
}

/// Result of an `add_note` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Note),
    /// Blank text; nothing was sent to the store.
    Ignored,
}

/// How a successful edit or delete landed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Applied,
    /// The store succeeded but no local note had that id.
    NoLocalMatch,
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Upper bound on a single store call.
    pub store_timeout: Duration,
    pub command_buffer: usize,
}

impl ManagerOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            ..Self::default()
        }
    }
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            command_buffer: 64,
        }
    }
}

/// Cloneable entry point for the presentation layer.
#[derive(Clone)]
pub struct NotesHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<NotesSnapshot>,
}

impl NotesHandle {
    /// Fetch the owner's notes and replace the collection with them.
    pub async fn load(&self, owner_id: OwnerId) -> NotesResult<LoadOutcome> {
        self.request(|reply| Command::Load { owner_id, reply }).await
    }

    /// Create a note and append it once the store confirms it.
    pub async fn add_note(
        &self,
        owner_id: OwnerId,
        text: impl Into<String>,
    ) -> NotesResult<AddOutcome> {
        let text = text.into();
        self.request(|reply| Command::Add {
            owner_id,
            text,
            reply,
        })
        .await
    }

    pub async fn edit_note(
        &self,
        note_id: NoteId,
        text: impl Into<String>,
    ) -> NotesResult<Reconciled> {
        let text = text.into();
        self.request(|reply| Command::Edit {
            note_id,
            text,
            reply,
        })
        .await
    }

    /// Delete a note. Confirmation is the caller's job.
    pub async fn delete_note(&self, note_id: NoteId) -> NotesResult<Reconciled> {
        self.request(|reply| Command::Delete { note_id, reply })
            .await
    }

    pub async fn open_composer(&self) -> NotesResult<()> {
        self.request(|reply| Command::OpenComposer { reply }).await
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> NotesResult<()> {
        let text = text.into();
        self.request(|reply| Command::SetDraft { text, reply })
            .await
    }

    /// Hide the composer, keeping the draft.
    pub async fn close_composer(&self) -> NotesResult<()> {
        self.request(|reply| Command::CloseComposer { reply })
            .await
    }

    /// Add the composer's draft as a note for the session owner.
    pub async fn submit_draft(&self) -> NotesResult<AddOutcome> {
        self.request(|reply| Command::SubmitDraft { reply }).await
    }

    pub async fn dismiss_notifications(&self) -> NotesResult<()> {
        self.request(|reply| Command::DismissNotifications { reply })
            .await
    }

    /// Re-run a failed load. `None` when no alert offered a retry.
    pub async fn retry(&self) -> NotesResult<Option<LoadOutcome>> {
        match self.request(|reply| Command::TakeRetry { reply }).await? {
            Some(owner_id) => self.load(owner_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Latest published state.
    pub fn snapshot(&self) -> NotesSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotesSnapshot> {
        self.snapshots.clone()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> NotesResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| NotesError::ManagerStopped)?;
        response.await.map_err(|_| NotesError::ManagerStopped)?
    }
}

pub struct NoteManager {
    store: Arc<dyn NoteStore>,
    options: ManagerOptions,
    state: NotesState,
    session: SessionState,
    epoch: u64,
    latest_load: u64,
    needs_load: bool,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    session_rx: watch::Receiver<SessionState>,
    snapshots: watch::Sender<NotesSnapshot>,
}

impl NoteManager {
    /// Start the manager on the current tokio runtime.
    ///
    /// The task stops once every [`NotesHandle`] has been dropped.
    pub fn spawn<S>(
        store: S,
        session_rx: watch::Receiver<SessionState>,
        options: ManagerOptions,
    ) -> NotesHandle
    where
        S: NoteStore + 'static,
    {
        let (command_tx, commands) = mpsc::channel(options.command_buffer.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(NotesSnapshot::default());

        let manager = Self {
            store: Arc::new(store),
            options,
            state: NotesState::new(),
            session: SessionState::default(),
            epoch: 0,
            latest_load: 0,
            needs_load: false,
            commands,
            completions_tx,
            completions,
            session_rx,
            snapshots,
        };
        tokio::spawn(manager.run());

        NotesHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(mut self) {
        let initial = self.session_rx.borrow_and_update().clone();
        self.on_session(initial);
        self.publish();

        let mut session_open = true;
        loop {
            tokio::select! {
                biased;
                Some(completion) = self.completions.recv() => self.on_completion(completion),
                changed = self.session_rx.changed(), if session_open => match changed {
                    Ok(()) => {
                        let session = self.session_rx.borrow_and_update().clone();
                        self.on_session(session);
                    }
                    Err(_) => session_open = false,
                },
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
            self.publish();
        }
        tracing::debug!("note manager stopped");
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    fn on_session(&mut self, session: SessionState) {
        if session.owner_id.as_ref() != self.state.collection.owner() {
            self.epoch += 1;
            self.state.reset_for_owner(session.owner_id.as_ref());
            self.needs_load = session.owner_id.is_some();
            tracing::info!(owner_id = ?session.owner_id, epoch = self.epoch, "session owner changed");
        }
        self.session = session;

        if self.needs_load {
            if let Some(owner_id) = self.session.active_owner().cloned() {
                self.needs_load = false;
                self.issue_load(owner_id, None);
            }
        }
    }

    /// Owner to act for, if the session permits store calls.
    fn authorize(&self, requested: Option<&OwnerId>) -> NotesResult<OwnerId> {
        let active = self.session.active_owner().ok_or(NotesError::NoSession)?;
        if let Some(requested) = requested {
            if requested != active {
                return Err(ValidationError::OwnerMismatch {
                    expected: active.clone(),
                    got: requested.clone(),
                }
                .into());
            }
        }
        Ok(active.clone())
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Load { owner_id, reply } => match self.authorize(Some(&owner_id)) {
                Ok(owner_id) => self.issue_load(owner_id, Some(reply)),
                Err(err) => self.fail(Some(reply), err, NotificationAction::Dismiss),
            },
            Command::Add {
                owner_id,
                text,
                reply,
            } => self.add(Some(owner_id), text, false, reply),
            Command::Edit {
                note_id,
                text,
                reply,
            } => self.edit(note_id, text, reply),
            Command::Delete { note_id, reply } => self.delete(note_id, reply),
            Command::OpenComposer { reply } => {
                self.state.composer.open = true;
                self.finish(Some(reply), Ok(()));
            }
            Command::SetDraft { text, reply } => {
                self.state.composer.draft = text;
                self.finish(Some(reply), Ok(()));
            }
            Command::CloseComposer { reply } => {
                self.state.composer.open = false;
                self.finish(Some(reply), Ok(()));
            }
            Command::SubmitDraft { reply } => {
                let text = self.state.composer.draft.clone();
                self.add(None, text, true, reply);
            }
            Command::DismissNotifications { reply } => {
                self.state.dismiss_notifications();
                self.finish(Some(reply), Ok(()));
            }
            Command::TakeRetry { reply } => {
                if self.state.take_retry() {
                    let owner_id = self.authorize(None).map(Some);
                    self.finish(Some(reply), owner_id);
                } else {
                    self.finish(Some(reply), Ok(None));
                }
            }
        }
    }

    fn issue_load(&mut self, owner_id: OwnerId, reply: Option<Reply<LoadOutcome>>) {
        self.latest_load += 1;
        let seq = self.latest_load;
        let epoch = self.epoch;
        self.state.loading = true;
        tracing::debug!(seq, owner_id = %owner_id, "issuing note list");

        let store = self.store.clone();
        let call_owner = owner_id.clone();
        self.spawn_call(
            async move { store.list(&call_owner).await },
            move |result| Completion::Listed {
                seq,
                epoch,
                owner_id,
                result,
                reply,
            },
        );
    }

    fn add(
        &mut self,
        owner_id: Option<OwnerId>,
        text: String,
        from_draft: bool,
        reply: Reply<AddOutcome>,
    ) {
        if validate_note_text(&text).is_err() {
            tracing::debug!(from_draft, "ignoring blank note");
            self.finish(Some(reply), Ok(AddOutcome::Ignored));
            return;
        }
        let owner_id = match self.authorize(owner_id.as_ref()) {
            Ok(owner_id) => owner_id,
            Err(err) => {
                self.fail(Some(reply), err, NotificationAction::Dismiss);
                return;
            }
        };

        self.state.pending += 1;
        let epoch = self.epoch;
        tracing::debug!(owner_id = %owner_id, from_draft, "issuing note create");

        let store = self.store.clone();
        self.spawn_call(
            async move { store.create(&owner_id, &text).await },
            move |result| Completion::Created {
                epoch,
                from_draft,
                result,
                reply,
            },
        );
    }

    fn edit(&mut self, note_id: NoteId, text: String, reply: Reply<Reconciled>) {
        if let Err(err) = validate_note_text(&text) {
            self.fail(Some(reply), err.into(), NotificationAction::Dismiss);
            return;
        }
        if let Err(err) = self.authorize(None) {
            self.fail(Some(reply), err, NotificationAction::Dismiss);
            return;
        }

        self.state.pending += 1;
        let epoch = self.epoch;
        tracing::debug!(note_id = %note_id, "issuing note update");

        let store = self.store.clone();
        let call_id = note_id.clone();
        self.spawn_call(
            async move { store.update(&call_id, &text).await },
            move |result| Completion::Updated {
                epoch,
                note_id,
                result,
                reply,
            },
        );
    }

    fn delete(&mut self, note_id: NoteId, reply: Reply<Reconciled>) {
        if let Err(err) = self.authorize(None) {
            self.fail(Some(reply), err, NotificationAction::Dismiss);
            return;
        }

        self.state.pending += 1;
        let epoch = self.epoch;
        tracing::debug!(note_id = %note_id, "issuing note delete");

        let store = self.store.clone();
        let call_id = note_id.clone();
        self.spawn_call(
            async move { store.delete(&call_id).await },
            move |result| Completion::Deleted {
                epoch,
                note_id,
                result,
                reply,
            },
        );
    }

    /// Run a store call in its own task, bounded by the store timeout, and
    /// feed its outcome back to the actor.
    fn spawn_call<T, F, C>(&self, call: F, complete: C)
    where
        T: Send + 'static,
        F: Future<Output = StoreResult<T>> + Send + 'static,
        C: FnOnce(StoreResult<T>) -> Completion + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        let limit = self.options.store_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout {
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            let _ = completions.send(complete(result));
        });
    }

    // ------------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------------

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Listed {
                seq,
                epoch,
                owner_id,
                result,
                reply,
            } => {
                if epoch != self.epoch || seq != self.latest_load {
                    tracing::debug!(seq, latest = self.latest_load, owner_id = %owner_id, "discarding superseded note list");
                    self.finish(reply, Ok(LoadOutcome::Superseded));
                    return;
                }
                self.state.loading = false;
                match result {
                    Ok(notes) => {
                        let count = self.state.collection.replace_all(notes);
                        self.state.clear_error();
                        tracing::debug!(seq, owner_id = %owner_id, count, "applied note list");
                        self.finish(reply, Ok(LoadOutcome::Applied { count }));
                    }
                    Err(err) => self.fail(reply, err.into(), NotificationAction::Retry),
                }
            }
            Completion::Created {
                epoch,
                from_draft,
                result,
                reply,
            } => {
                if !self.settle(epoch) {
                    self.finish(Some(reply), Err(NotesError::NoSession));
                    return;
                }
                match result {
                    Ok(note) => {
                        if self.state.collection.append(note.clone()) {
                            self.state.clear_error();
                            self.settle_draft(from_draft, true);
                            tracing::debug!(note_id = %note.id, "appended created note");
                            self.finish(Some(reply), Ok(AddOutcome::Added(note)));
                        } else {
                            self.settle_draft(from_draft, false);
                            let err = StoreError::InvalidResponse {
                                reason: format!(
                                    "created note {} belongs to owner {}",
                                    note.id, note.owner_id
                                ),
                            };
                            self.fail(Some(reply), err.into(), NotificationAction::Dismiss);
                        }
                    }
                    Err(err) => {
                        self.settle_draft(from_draft, false);
                        self.fail(Some(reply), err.into(), NotificationAction::Dismiss);
                    }
                }
            }
            Completion::Updated {
                epoch,
                note_id,
                result,
                reply,
            } => {
                if !self.settle(epoch) {
                    self.finish(Some(reply), Err(NotesError::NoSession));
                    return;
                }
                match result {
                    Ok(updated) => {
                        let outcome = if self.state.collection.update_text(&note_id, updated.text) {
                            Reconciled::Applied
                        } else {
                            tracing::debug!(note_id = %note_id, "updated note not present locally");
                            Reconciled::NoLocalMatch
                        };
                        self.state.clear_error();
                        self.finish(Some(reply), Ok(outcome));
                    }
                    Err(err) => self.fail(Some(reply), err.into(), NotificationAction::Dismiss),
                }
            }
            Completion::Deleted {
                epoch,
                note_id,
                result,
                reply,
            } => {
                if !self.settle(epoch) {
                    self.finish(Some(reply), Err(NotesError::NoSession));
                    return;
                }
                match result {
                    Ok(()) => {
                        let outcome = if self.state.collection.remove(&note_id) {
                            Reconciled::Applied
                        } else {
                            tracing::debug!(note_id = %note_id, "deleted note not present locally");
                            Reconciled::NoLocalMatch
                        };
                        self.state.clear_error();
                        self.finish(Some(reply), Ok(outcome));
                    }
                    Err(err) => self.fail(Some(reply), err.into(), NotificationAction::Dismiss),
                }
            }
        }
    }

    /// Close out a mutation issued under `epoch`. Returns false when the
    /// session has moved on and the result must be dropped.
    fn settle(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "dropping result from previous session");
            return false;
        }
        self.state.pending = self.state.pending.saturating_sub(1);
        true
    }

    fn settle_draft(&mut self, from_draft: bool, succeeded: bool) {
        if !from_draft {
            return;
        }
        self.state.composer.open = false;
        if succeeded {
            self.state.composer.draft.clear();
        }
    }

    fn fail<T>(
        &mut self,
        reply: Option<Reply<T>>,
        err: NotesError,
        action: NotificationAction,
    ) {
        if err.is_surfaced() {
            tracing::warn!(error = %err, "note operation failed");
            self.state.surface(&err, action);
        } else {
            tracing::debug!(error = %err, "note operation rejected");
        }
        self.finish(reply, Err(err));
    }

    /// Publish the current state, then answer the caller, so a caller that
    /// reads a snapshot after its reply sees the reconciled state.
    fn finish<T>(&mut self, reply: Option<Reply<T>>, result: NotesResult<T>) {
        self.publish();
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }

    fn publish(&self) {
        let next = self.state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
