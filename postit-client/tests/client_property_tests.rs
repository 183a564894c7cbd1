use postit_client::config::{AuthConfig, ClientConfig, SessionConfig};
use postit_client::repl::{parse_command, render_notes, ReplCommand};
use postit_client::state::NotesSnapshot;
use postit_core::{Note, NoteId};
use postit_test_utils::fixtures::test_owner;
use postit_test_utils::generators::{arb_note_text, arb_owner_id};
use proptest::prelude::*;

fn base_config() -> ClientConfig {
    ClientConfig {
        api_base_url: "http://localhost:8080".to_string(),
        auth: AuthConfig {
            api_key: Some("test-key".to_string()),
            jwt: None,
        },
        request_timeout_ms: 5_000,
        store_timeout_ms: 10_000,
        log_filter: "info".to_string(),
        session: None,
        offline: false,
    }
}

#[test]
fn base_config_is_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn offline_config_needs_no_credentials() {
    let mut config = base_config();
    config.auth = AuthConfig {
        api_key: None,
        jwt: None,
    };
    assert!(config.validate().is_err());
    config.offline = true;
    assert!(config.validate().is_ok());
}

proptest! {
    // ========================================================================
    // Config validation
    // ========================================================================

    #[test]
    fn positive_timeouts_accepted(request in 1u64..60_000, store in 1u64..120_000) {
        let mut config = base_config();
        config.request_timeout_ms = request;
        config.store_timeout_ms = store;
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn configured_session_owner_parses(owner_id in arb_owner_id()) {
        let mut config = base_config();
        config.session = Some(SessionConfig { owner_id: format!("  {}  ", owner_id) });
        prop_assert!(config.validate().is_ok());
        prop_assert_eq!(config.session_owner(), Some(owner_id));
    }

    #[test]
    fn blank_log_filter_rejected(filter in "[ \t]{0,4}") {
        let mut config = base_config();
        config.log_filter = filter;
        prop_assert!(config.validate().is_err());
    }

    // ========================================================================
    // Command parsing
    // ========================================================================

    #[test]
    fn add_keeps_note_text(text in arb_note_text()) {
        let parsed = parse_command(&format!("add {}", text));
        prop_assert_eq!(parsed, Ok(ReplCommand::Add(text.trim().to_string())));
    }

    #[test]
    fn edit_splits_first_word_as_id(id in "[a-z0-9-]{1,12}", text in arb_note_text()) {
        let parsed = parse_command(&format!("edit {} {}", id, text));
        prop_assert_eq!(
            parsed,
            Ok(ReplCommand::Edit { id: NoteId::new(id), text: text.trim().to_string() })
        );
    }

    #[test]
    fn parse_never_panics(line in "\\PC{0,64}") {
        let _ = parse_command(&line);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    #[test]
    fn render_lists_every_note(texts in prop::collection::vec(arb_note_text(), 1..8)) {
        let owner = test_owner();
        let notes: Vec<Note> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Note::new(NoteId::new(format!("n{}", i)), owner.clone(), text.clone()))
            .collect();
        let snapshot = NotesSnapshot {
            owner_id: Some(owner),
            notes,
            ..NotesSnapshot::default()
        };

        let rendered = render_notes(&snapshot);
        prop_assert!(!rendered.contains("You have no notes"));
        prop_assert_eq!(rendered.lines().count(), texts.len());
        for (i, text) in texts.iter().enumerate() {
            let expected = format!("[n{}] {}", i, text);
            prop_assert!(rendered.contains(&expected));
        }
    }
}
