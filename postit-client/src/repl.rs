//! Line commands for the terminal front end, and snapshot rendering.

use crate::state::NotesSnapshot;
use postit_core::NoteId;
use std::fmt::Write as _;

pub const HELP: &str = "\
Commands:
  list                 show notes
  reload               fetch notes again
  add <text>           add a note
  new                  open the composer
  draft <text>         set the composer text
  save                 add the composer text as a note
  cancel               close the composer
  edit <id> <text>     replace a note's text
  delete <id>          delete a note (asks first)
  retry                re-run a failed load
  dismiss              clear alerts
  help                 show this help
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    List,
    Reload,
    Add(String),
    New,
    Draft(String),
    Save,
    Cancel,
    Edit { id: NoteId, text: String },
    Delete(NoteId),
    Retry,
    Dismiss,
    Help,
    Quit,
    /// Blank line.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("Usage: {0}")]
    MissingArgument(&'static str),
}

/// Parse one input line. Note text after the command keeps its inner
/// spacing; emptiness is left to the note manager to judge.
pub fn parse_command(line: &str) -> Result<ReplCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Nothing);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => ReplCommand::List,
        "reload" => ReplCommand::Reload,
        "add" => ReplCommand::Add(rest.to_string()),
        "new" => ReplCommand::New,
        "draft" => ReplCommand::Draft(rest.to_string()),
        "save" => ReplCommand::Save,
        "cancel" => ReplCommand::Cancel,
        "edit" => {
            let (id, text) = match rest.split_once(char::is_whitespace) {
                Some((id, text)) => (id, text.trim_start()),
                None => (rest, ""),
            };
            if id.is_empty() {
                return Err(ParseError::MissingArgument("edit <id> <text>"));
            }
            ReplCommand::Edit {
                id: NoteId::new(id),
                text: text.to_string(),
            }
        }
        "delete" | "rm" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("delete <id>"));
            }
            ReplCommand::Delete(NoteId::new(rest))
        }
        "retry" => ReplCommand::Retry,
        "dismiss" => ReplCommand::Dismiss,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// True when a confirmation answer means yes. Anything else is a no.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Render the note list the way the front end prints it.
pub fn render_notes(snapshot: &NotesSnapshot) -> String {
    let mut out = String::new();
    if snapshot.loading {
        out.push_str("Loading notes...\n");
    }
    if snapshot.notes.is_empty() {
        if !snapshot.loading {
            out.push_str("You have no notes\n");
        }
    } else {
        for note in &snapshot.notes {
            let _ = writeln!(out, "[{}] {}", note.id, note.text);
        }
    }
    if snapshot.composer.open {
        let _ = writeln!(out, "(composer open) draft: {}", snapshot.composer.draft);
    }
    if snapshot.notifications.is_empty() {
        if let Some(error) = &snapshot.error {
            let _ = writeln!(out, "! {}", error);
        }
    }
    for notification in &snapshot.notifications {
        let _ = writeln!(
            out,
            "! {} (type '{}')",
            notification.message,
            notification.action.command()
        );
    }
    out
}
