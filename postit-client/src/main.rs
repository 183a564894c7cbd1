//! postit terminal client entry point.

use postit_client::api_client::RestNoteStore;
use postit_client::config::ClientConfig;
use postit_client::error::ClientError;
use postit_client::manager::{
    AddOutcome, LoadOutcome, ManagerOptions, NoteManager, NotesHandle, Reconciled,
};
use postit_client::repl::{is_confirmation, parse_command, render_notes, ReplCommand, HELP};
use postit_client::session::{SessionProvider, SessionState};
use postit_client::telemetry;
use postit_core::{NotesError, NotesResult, OwnerId};
use postit_store::MockNoteStore;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = ClientConfig::load()?;
    run(config).await?;
    Ok(())
}

async fn run(config: ClientConfig) -> Result<(), ClientError> {
    telemetry::init_tracing(&config.log_filter)?;

    let session = match config.session_owner() {
        Some(owner_id) => SessionProvider::ready(owner_id),
        None => {
            tracing::warn!("no session configured; note commands will be rejected");
            SessionProvider::new(SessionState::signed_out())
        }
    };

    let handle = spawn_manager(&config, &session)?;
    tracing::info!(offline = config.offline, base_url = %config.api_base_url, "postit started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);
    loop {
        prompt("> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }
        execute(&handle, &session, command, &mut lines).await?;
    }
    Ok(())
}

fn spawn_manager(
    config: &ClientConfig,
    session: &SessionProvider,
) -> Result<NotesHandle, ClientError> {
    let options = ManagerOptions::from_config(config);
    let handle = if config.offline {
        NoteManager::spawn(MockNoteStore::new(), session.subscribe(), options)
    } else {
        let store = RestNoteStore::new(config)?;
        NoteManager::spawn(store, session.subscribe(), options)
    };
    Ok(handle)
}

async fn execute(
    handle: &NotesHandle,
    session: &SessionProvider,
    command: ReplCommand,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), ClientError> {
    match command {
        ReplCommand::List => print!("{}", render_notes(&handle.snapshot())),
        ReplCommand::Reload => {
            if let Some(owner_id) = session_owner(session) {
                let result = handle.load(owner_id).await;
                if let Some(LoadOutcome::Applied { .. }) = report(result) {
                    print!("{}", render_notes(&handle.snapshot()));
                }
            }
        }
        ReplCommand::Add(text) => {
            if let Some(owner_id) = session_owner(session) {
                report_add(handle.add_note(owner_id, text).await);
            }
        }
        ReplCommand::New => {
            report(handle.open_composer().await);
            println!("Composer open. Use 'draft <text>' then 'save'.");
        }
        ReplCommand::Draft(text) => {
            report(handle.set_draft(text).await);
        }
        ReplCommand::Save => report_add(handle.submit_draft().await),
        ReplCommand::Cancel => {
            report(handle.close_composer().await);
        }
        ReplCommand::Edit { id, text } => {
            report_reconciled("Updated", handle.edit_note(id, text).await);
        }
        ReplCommand::Delete(id) => {
            prompt(&format!("Delete note {}? [y/N] ", id))?;
            let answer = lines.next_line().await?.unwrap_or_default();
            if is_confirmation(&answer) {
                report_reconciled("Deleted", handle.delete_note(id).await);
            } else {
                println!("Cancelled");
            }
        }
        ReplCommand::Retry => match report(handle.retry().await) {
            Some(Some(LoadOutcome::Applied { .. })) => print!("{}", render_notes(&handle.snapshot())),
            Some(None) => println!("Nothing to retry"),
            Some(Some(LoadOutcome::Superseded)) | None => {}
        },
        ReplCommand::Dismiss => {
            report(handle.dismiss_notifications().await);
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit | ReplCommand::Nothing => {}
    }
    Ok(())
}

fn session_owner(session: &SessionProvider) -> Option<OwnerId> {
    let owner_id = session.current().active_owner().cloned();
    if owner_id.is_none() {
        println!("{}", NotesError::NoSession);
    }
    owner_id
}

fn report<T>(result: NotesResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            println!("error: {}", err);
            None
        }
    }
}

fn report_add(result: NotesResult<AddOutcome>) {
    match report(result) {
        Some(AddOutcome::Added(note)) => println!("Added [{}] {}", note.id, note.text),
        Some(AddOutcome::Ignored) => println!("Nothing to add"),
        None => {}
    }
}

fn report_reconciled(verb: &str, result: NotesResult<Reconciled>) {
    match report(result) {
        Some(Reconciled::Applied) => println!("{}", verb),
        Some(Reconciled::NoLocalMatch) => println!("{} (note was not in the local list)", verb),
        None => {}
    }
}

fn prompt(text: &str) -> Result<(), ClientError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}
