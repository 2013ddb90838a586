//! Application state for the TUI.
//!
//! Holds the session, the in-progress text of every input widget and the
//! focus. Key presses update that state and may produce a `UiEvent`, which is
//! then run through the session's pipeline by `App::dispatch`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::error;

use crate::app::{ChatSession, Cycle, CycleOutcome, Field, Notice, PendingAnswer, UiEvent};
use crate::error::Result;
use crate::config::DatabaseMode;

/// Lines scrolled by PageUp / PageDown.
const SCROLL_STEP: usize = 10;

const REMOTE_FIELDS: [Field; 4] = [Field::Host, Field::User, Field::Password, Field::Database];

/// Which widget currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    ModeSelector,
    Field(Field),
    ClearButton,
    #[default]
    Question,
}

impl Focus {
    /// Name used by the headless `focus:` event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModeSelector => "mode",
            Self::Field(Field::Host) => "host",
            Self::Field(Field::User) => "user",
            Self::Field(Field::Password) => "password",
            Self::Field(Field::Database) => "database",
            Self::Field(Field::ApiKey) => "api-key",
            Self::ClearButton => "clear",
            Self::Question => "question",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let focus = match name.trim().to_lowercase().as_str() {
            "mode" => Self::ModeSelector,
            "host" => Self::Field(Field::Host),
            "user" => Self::Field(Field::User),
            "password" => Self::Field(Field::Password),
            "database" | "db" => Self::Field(Field::Database),
            "api-key" | "apikey" | "key" => Self::Field(Field::ApiKey),
            "clear" => Self::ClearButton,
            "question" | "input" => Self::Question,
            _ => return None,
        };
        Some(focus)
    }
}

/// Input state for text editing.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index();
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    fn edit(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    pub focus: Focus,
    pub session: ChatSession,
    /// Uncommitted text of the settings fields.
    drafts: Vec<(Field, InputState)>,
    /// Question box.
    pub question: InputState,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
    pub notice: Option<Notice>,
    /// True while the agent is answering.
    pub is_processing: bool,
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        let drafts = REMOTE_FIELDS
            .iter()
            .chain(std::iter::once(&Field::ApiKey))
            .map(|&field| (field, InputState::with_text(session.settings().get(field))))
            .collect();

        Self {
            running: true,
            focus: Focus::default(),
            session,
            drafts,
            question: InputState::new(),
            chat_scroll: 0,
            notice: None,
            is_processing: false,
        }
    }

    pub fn mode(&self) -> DatabaseMode {
        self.session.settings().mode
    }

    /// The uncommitted text of a settings field.
    pub fn draft(&self, field: Field) -> &InputState {
        self.drafts
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, input)| input)
            .unwrap_or(&self.question)
    }

    fn draft_mut(&mut self, field: Field) -> Option<&mut InputState> {
        self.drafts
            .iter_mut()
            .find(|(f, _)| *f == field)
            .map(|(_, input)| input)
    }

    /// Widgets reachable with Tab, in order. Remote fields are only present in
    /// remote mode.
    pub fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::ModeSelector];
        if self.mode() == DatabaseMode::Remote {
            order.extend(REMOTE_FIELDS.iter().map(|&f| Focus::Field(f)));
        }
        order.extend([Focus::Field(Field::ApiKey), Focus::ClearButton, Focus::Question]);
        order
    }

    /// Moves focus, committing the field being left if it changed.
    pub fn set_focus(&mut self, focus: Focus) -> Option<UiEvent> {
        let commit = self.commit_current();
        self.focus = focus;
        commit
    }

    fn cycle_focus(&mut self, forward: bool) -> Option<UiEvent> {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % order.len()
        } else {
            (pos + order.len() - 1) % order.len()
        };
        self.set_focus(order[next])
    }

    fn commit_current(&self) -> Option<UiEvent> {
        let Focus::Field(field) = self.focus else {
            return None;
        };
        let draft = &self.draft(field).text;
        (draft != self.session.settings().get(field))
            .then(|| UiEvent::EditField(field, draft.clone()))
    }

    /// Handles a key press and returns the event it triggers, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                None
            }
            KeyCode::Char('l') if ctrl => Some(UiEvent::ClearHistory),
            KeyCode::Tab => self.cycle_focus(true),
            KeyCode::BackTab => self.cycle_focus(false),
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(SCROLL_STEP);
                None
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(SCROLL_STEP);
                None
            }
            _ => match self.focus {
                Focus::ModeSelector => self.handle_mode_key(key),
                Focus::Field(field) => self.handle_field_key(field, key),
                Focus::ClearButton => match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') => Some(UiEvent::ClearHistory),
                    _ => None,
                },
                Focus::Question => self.handle_question_key(key),
            },
        }
    }

    fn handle_mode_key(&mut self, key: KeyEvent) -> Option<UiEvent> {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                Some(UiEvent::SelectMode(self.mode().toggle()))
            }
            _ => None,
        }
    }

    fn handle_field_key(&mut self, field: Field, key: KeyEvent) -> Option<UiEvent> {
        if key.code == KeyCode::Enter {
            return self.commit_current();
        }
        if let Some(draft) = self.draft_mut(field) {
            draft.edit(key);
        }
        None
    }

    fn handle_question_key(&mut self, key: KeyEvent) -> Option<UiEvent> {
        if key.code == KeyCode::Enter {
            let text = self.question.take();
            return (!text.trim().is_empty()).then_some(UiEvent::Submit(text));
        }
        self.question.edit(key);
        None
    }

    /// Runs an event through the session's pipeline and records the outcome.
    pub async fn dispatch(&mut self, event: UiEvent) {
        if let Some(pending) = self.begin(event).await {
            self.finish(pending).await;
        }
    }

    /// Runs the pipeline up to the agent call.
    ///
    /// Returns the pending answer when a question was accepted; its user turn
    /// is already in the history and `is_processing` stays set until
    /// [`App::finish`].
    pub async fn begin(&mut self, event: UiEvent) -> Option<PendingAnswer> {
        match self.session.begin(event).await {
            Ok(Cycle::Pending(pending)) => {
                self.notice = None;
                self.chat_scroll = 0;
                self.is_processing = true;
                Some(pending)
            }
            Ok(Cycle::Done(outcome)) => {
                self.record(Ok(outcome));
                None
            }
            Err(e) => {
                self.record(Err(e));
                None
            }
        }
    }

    /// Waits for the agent's answer and records it.
    pub async fn finish(&mut self, pending: PendingAnswer) {
        let outcome = self.session.finish(pending).await;
        self.record(outcome);
    }

    fn record(&mut self, outcome: Result<CycleOutcome>) {
        match outcome {
            Ok(CycleOutcome::Halted(notice)) => self.notice = Some(notice),
            Ok(CycleOutcome::Ready) => self.notice = None,
            Ok(CycleOutcome::Answered(_)) => {
                self.notice = None;
                self.chat_scroll = 0;
            }
            Err(e) => {
                error!("{}: {}", e.category(), e);
                self.notice = Some(Notice::error(e.to_string()));
            }
        }
        self.is_processing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{SessionSettings, SharedResources};
    use crate::config::AgentConfig;
    use crate::connection::ConnectionConfigurator;
    use crate::llm::LlmProvider;

    fn app(settings: SessionSettings) -> App {
        let shared = SharedResources::new(
            ConnectionConfigurator::with_sqlx(
                std::time::Duration::from_secs(60),
                "/nonexistent/student.db",
            ),
            LlmProvider::Mock,
            "gpt-4o-mini",
            AgentConfig::default(),
        );
        App::new(ChatSession::new(shared, settings))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_input_insert() {
        let mut input = InputState::new();
        input.insert('h');
        input.insert('i');
        assert_eq!(input.text, "hi");
        assert_eq!(input.cursor, 2);
    }

    #[test]
    fn test_input_backspace() {
        let mut input = InputState::with_text("hello");
        input.backspace();
        assert_eq!(input.text, "hell");
        assert_eq!(input.cursor, 4);
    }

    #[test]
    fn test_input_backspace_at_start() {
        let mut input = InputState::with_text("hello");
        input.cursor = 0;
        input.backspace();
        assert_eq!(input.text, "hello");
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_input_delete() {
        let mut input = InputState::with_text("hello");
        input.cursor = 0;
        input.delete();
        assert_eq!(input.text, "ello");
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_input_multibyte_characters() {
        let mut input = InputState::with_text("pässwörd");
        input.move_left();
        input.backspace();
        assert_eq!(input.text, "pässwöd");
        input.insert('r');
        assert_eq!(input.text, "pässwörd");
    }

    #[test]
    fn test_input_cursor_movement() {
        let mut input = InputState::with_text("hello");
        input.cursor = 2;

        input.move_left();
        assert_eq!(input.cursor, 1);

        input.move_right();
        assert_eq!(input.cursor, 2);

        input.move_home();
        assert_eq!(input.cursor, 0);

        input.move_end();
        assert_eq!(input.cursor, 5);
    }

    #[test]
    fn test_input_take() {
        let mut input = InputState::with_text("hello");
        let text = input.take();
        assert_eq!(text, "hello");
        assert!(input.text.is_empty());
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_focus_order_depends_on_mode() {
        let embedded = app(SessionSettings::default());
        assert_eq!(embedded.focus_order().len(), 4);

        let remote = app(SessionSettings {
            mode: DatabaseMode::Remote,
            ..SessionSettings::default()
        });
        assert_eq!(remote.focus_order().len(), 8);
        assert_eq!(remote.focus_order()[1], Focus::Field(Field::Host));
    }

    #[test]
    fn test_tab_cycles_and_wraps() {
        let mut app = app(SessionSettings::default());
        assert_eq!(app.focus, Focus::Question);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::ModeSelector);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Focus::Question);
    }

    #[test]
    fn test_field_commits_on_enter_and_focus_leave() {
        let mut app = app(SessionSettings::default());
        app.set_focus(Focus::Field(Field::ApiKey));
        for c in "sk-1".chars() {
            assert_eq!(app.handle_key(key(KeyCode::Char(c))), None);
        }
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(UiEvent::EditField(Field::ApiKey, "sk-1".into()))
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Tab)),
            Some(UiEvent::EditField(Field::ApiKey, "sk-1".into()))
        );
        assert_eq!(app.focus, Focus::ClearButton);
    }

    #[test]
    fn test_mode_selector_toggles() {
        let mut app = app(SessionSettings::default());
        app.set_focus(Focus::ModeSelector);
        assert_eq!(
            app.handle_key(key(KeyCode::Right)),
            Some(UiEvent::SelectMode(DatabaseMode::Remote))
        );
    }

    #[test]
    fn test_question_submit_and_blank() {
        let mut app = app(SessionSettings::default());
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        for c in "hi".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(UiEvent::Submit("hi".into()))
        );
        assert!(app.question.is_empty());
    }

    #[test]
    fn test_ctrl_keys() {
        let mut app = app(SessionSettings::default());
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            Some(UiEvent::ClearHistory)
        );
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn test_focus_names_round_trip() {
        let app = app(SessionSettings {
            mode: DatabaseMode::Remote,
            ..SessionSettings::default()
        });
        for focus in app.focus_order() {
            assert_eq!(Focus::from_name(focus.name()), Some(focus));
        }
        assert_eq!(Focus::from_name("sidebar"), None);
    }

    #[tokio::test]
    async fn test_dispatch_without_key_shows_warning() {
        let mut app = app(SessionSettings::default());
        app.dispatch(UiEvent::Refresh).await;
        assert_eq!(
            app.notice,
            Some(Notice::warning(crate::app::MISSING_API_KEY_MESSAGE))
        );
        assert!(!app.is_processing);
    }

    #[tokio::test]
    async fn test_dispatch_connection_error_becomes_notice() {
        let mut app = app(SessionSettings {
            api_key: "sk-test".into(),
            ..SessionSettings::default()
        });
        app.dispatch(UiEvent::Refresh).await;
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.level, crate::app::NoticeLevel::Error);
        assert!(notice.message.starts_with("Connection error"));
    }
}
