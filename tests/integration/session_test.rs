//! Interaction pipeline tests: settings, handle reuse and chat history.

use std::sync::Arc;

use dbchat::app::{
    ChatSession, CycleOutcome, Field, NoticeLevel, SessionSettings, SharedResources, UiEvent,
    MISSING_API_KEY_MESSAGE,
};
use dbchat::config::{Config, DatabaseMode};
use dbchat::connection::INCOMPLETE_REMOTE_MESSAGE;
use dbchat::llm::{LlmProvider, MockLlmClient};
use dbchat::session::TurnRole;
use pretty_assertions::assert_eq;

use super::sample_db;

fn shared(path: &std::path::Path) -> SharedResources {
    let mut config = Config::default();
    config.database.embedded_path = Some(path.to_path_buf());
    SharedResources::from_config(&config, LlmProvider::Mock)
}

fn with_key() -> SessionSettings {
    SessionSettings {
        api_key: "sk-test".to_string(),
        ..SessionSettings::default()
    }
}

#[tokio::test]
async fn test_question_appends_user_and_assistant_turns() {
    let (_dir, path) = sample_db().await;
    let mut session = ChatSession::new(shared(&path), with_key());

    let outcome = session
        .handle_event(UiEvent::Submit("How many students are there?".to_string()))
        .await
        .unwrap();

    let CycleOutcome::Answered(answer) = outcome else {
        panic!("expected an answer, got {outcome:?}");
    };
    assert!(!answer.is_empty());

    let turns = session.history().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].role, TurnRole::User);
    assert_eq!(turns[1].content, "How many students are there?");
    assert_eq!(turns[2].role, TurnRole::Assistant);
    assert_eq!(turns[2].content, answer);
    assert_eq!(
        session.connection_info(),
        Some(format!("sqlite://{}", path.display()).as_str())
    );
}

#[tokio::test]
async fn test_missing_key_opens_nothing() {
    let (_dir, path) = sample_db().await;
    let mut session = ChatSession::new(shared(&path), SessionSettings::default());

    let outcome = session
        .handle_event(UiEvent::Submit("How many students are there?".to_string()))
        .await
        .unwrap();

    match outcome {
        CycleOutcome::Halted(notice) => {
            assert_eq!(notice.level, NoticeLevel::Warning);
            assert_eq!(notice.message, MISSING_API_KEY_MESSAGE);
        }
        other => panic!("expected a halted cycle, got {other:?}"),
    }
    assert!(session.shared().configurator().cache().is_empty());
    assert_eq!(session.agents_built(), 0);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_remote_with_empty_host_halts() {
    let (_dir, path) = sample_db().await;
    let settings = SessionSettings {
        mode: DatabaseMode::Remote,
        user: "reader".to_string(),
        password: "secret".to_string(),
        database: "school".to_string(),
        ..with_key()
    };
    let mut session = ChatSession::new(shared(&path), settings);

    let outcome = session
        .handle_event(UiEvent::Submit("How many students are there?".to_string()))
        .await
        .unwrap();

    match outcome {
        CycleOutcome::Halted(notice) => {
            assert_eq!(notice.level, NoticeLevel::Error);
            assert_eq!(notice.message, INCOMPLETE_REMOTE_MESSAGE);
        }
        other => panic!("expected a halted cycle, got {other:?}"),
    }
    assert!(session.shared().configurator().cache().is_empty());
    assert_eq!(session.agents_built(), 0);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.connection_info(), None);
}

#[tokio::test]
async fn test_sessions_share_the_handle_cache() {
    let (_dir, path) = sample_db().await;
    let shared = shared(&path);
    let mut first = ChatSession::new(shared.clone(), with_key());
    let mut second = ChatSession::new(shared.clone(), with_key());

    first.handle_event(UiEvent::Refresh).await.unwrap();
    second.handle_event(UiEvent::Refresh).await.unwrap();
    first.handle_event(UiEvent::Refresh).await.unwrap();

    assert_eq!(shared.configurator().cache().len(), 1);
    // Agents are rebuilt on every cycle
    assert_eq!(first.agents_built(), 2);
    assert_eq!(second.agents_built(), 1);
}

#[tokio::test]
async fn test_clear_history_leaves_only_greeting() {
    let (_dir, path) = sample_db().await;
    let mut session = ChatSession::new(shared(&path), with_key());

    for _ in 0..3 {
        session
            .handle_event(UiEvent::Submit("How many students are there?".to_string()))
            .await
            .unwrap();
    }
    assert_eq!(session.history().len(), 7);

    session.handle_event(UiEvent::ClearHistory).await.unwrap();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().turns()[0].role, TurnRole::Assistant);
}

#[tokio::test]
async fn test_entering_the_key_enables_the_pipeline() {
    let (_dir, path) = sample_db().await;
    let mut session = ChatSession::new(shared(&path), SessionSettings::default());

    let outcome = session.handle_event(UiEvent::Refresh).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Halted(_)));

    let outcome = session
        .handle_event(UiEvent::EditField(Field::ApiKey, "sk-test".to_string()))
        .await
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Ready));
    assert_eq!(session.settings().api_key, "sk-test");
}

#[tokio::test]
async fn test_agent_failure_keeps_only_the_user_turn() {
    let (_dir, path) = sample_db().await;
    let shared = shared(&path).with_llm_client(Arc::new(MockLlmClient::failing("rate limited")));
    let mut session = ChatSession::new(shared, with_key());

    let err = session
        .handle_event(UiEvent::Submit("How many students are there?".to_string()))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "LLM Error");
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history().last().map(|t| t.role), Some(TurnRole::User));
}

#[tokio::test]
async fn test_question_is_on_screen_while_agent_thinks() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use dbchat::tui::headless::screen_text;
    use dbchat::tui::{ui, App};
    use ratatui::{backend::TestBackend, Terminal};

    let (_dir, path) = sample_db().await;
    let mut app = App::new(ChatSession::new(shared(&path), with_key()));
    app.dispatch(UiEvent::Refresh).await;

    for c in "How many students are there?".chars() {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }
    let event = app
        .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
        .unwrap();
    let pending = app.begin(event).await.expect("question accepted");
    assert!(app.is_processing);

    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| ui::render(frame, &app)).unwrap();
    let screen = screen_text(terminal.backend().buffer());
    assert!(screen.contains("How many students are there?"), "{screen}");
    assert!(screen.contains("Thinking..."), "{screen}");

    app.finish(pending).await;
    assert!(!app.is_processing);
    assert_eq!(app.session.history().len(), 3);
}
