//! Event DSL parser for headless mode.
//!
//! Parses event strings like "key:enter", "type:hello", "focus:api-key" into
//! executable events.

use crate::error::{ChatError, Result};
use crate::tui::app::{App, Focus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::time::Duration;

/// Comparison used by count assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ge,
    Le,
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    fn holds(&self, actual: usize, expected: usize) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Ge => actual >= expected,
            Self::Le => actual <= expected,
        }
    }
}

/// An assertion to check against the screen or state.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen does not contain text.
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// Number of chat turns, greeting included.
    Turns { op: Comparison, count: usize },
    /// State field equals value.
    State { field: String, value: String },
}

impl Assertion {
    /// Checks the assertion against the screen and app state.
    pub fn check(&self, screen: &str, app: &App) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::Turns { op, count } => op.holds(app.session.history().len(), *count),
            Self::State { field, value } => {
                state_field(app, field).as_deref() == Some(value.as_str())
            }
        }
    }
}

/// Gets a state field value from the app.
fn state_field(app: &App, field: &str) -> Option<String> {
    let value = match field {
        "focus" => app.focus.name().to_string(),
        "mode" => app.mode().as_str().to_string(),
        "input_text" => app.question.text.clone(),
        "is_processing" => app.is_processing.to_string(),
        "running" => app.running.to_string(),
        "turn_count" => app.session.history().len().to_string(),
        "notice" => app
            .notice
            .as_ref()
            .map(|n| n.message.clone())
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// A parsed event that can be executed.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// Type text into the focused widget.
    Type(String),
    /// Move focus to a widget.
    Focus(Focus),
    /// Wait for a duration.
    Wait(Duration),
    /// Resize the terminal.
    Resize(u16, u16),
    /// Assert something about the screen or state.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                let mut parts = Vec::new();
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    parts.push("ctrl".to_string());
                }
                if key.modifiers.contains(KeyModifiers::ALT) {
                    parts.push("alt".to_string());
                }
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    parts.push("shift".to_string());
                }
                parts.push(key_code_to_string(&key.code));
                write!(f, "key:{}", parts.join("+"))
            }
            Self::Type(text) => write!(f, "type:{}", text),
            Self::Focus(focus) => write!(f, "focus:{}", focus.name()),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{}x{}", w, h),
            Self::Assert(a) => match a {
                Assertion::Contains(t) => write!(f, "assert:contains:{}", t),
                Assertion::NotContains(t) => write!(f, "assert:not-contains:{}", t),
                Assertion::Matches(p) => write!(f, "assert:matches:{}", p),
                Assertion::Turns { op, count } => {
                    write!(f, "assert:turns{}{}", op.symbol(), count)
                }
                Assertion::State { field, value } => {
                    write!(f, "assert:state:{}={}", field, value)
                }
            },
        }
    }
}

fn key_code_to_string(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    /// Creates a new event parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses all events from an input string.
    /// Supports comma-separated and newline-separated events.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        for line in input.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            for part in line.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }

                events.push(self.parse_one(part)?);
            }
        }

        Ok(events)
    }

    /// Parses a single event string.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();

        let (event_type, value) = match input.split_once(':') {
            Some((t, v)) => (t.trim().to_lowercase(), v),
            None => {
                return Err(ChatError::config(format!(
                    "Invalid event syntax: '{}'. Expected format: type:value",
                    input
                )));
            }
        };

        match event_type.as_str() {
            "key" => self.parse_key(value.trim()),
            // Typed text keeps its inner spacing
            "type" => Ok(Event::Type(value.to_string())),
            "focus" => Focus::from_name(value).map(Event::Focus).ok_or_else(|| {
                ChatError::config(format!(
                    "Unknown widget: '{}'. Valid widgets: mode, host, user, password, database, api-key, clear, question",
                    value.trim()
                ))
            }),
            "wait" => self.parse_wait(value.trim()),
            "resize" => self.parse_resize(value.trim()),
            "assert" => self.parse_assert(value.trim()),
            _ => Err(ChatError::config(format!(
                "Unknown event type: '{}'. Valid types: key, type, focus, wait, resize, assert",
                event_type
            ))),
        }
    }

    /// Parses a key event like "enter", "ctrl+c", "shift+tab".
    fn parse_key(&self, value: &str) -> Result<Event> {
        let parts: Vec<&str> = value.split('+').collect();
        let mut modifiers = KeyModifiers::empty();
        let mut key_str = "";

        for (i, part) in parts.iter().enumerate() {
            if i == parts.len() - 1 {
                key_str = part;
                continue;
            }
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    return Err(ChatError::config(format!(
                        "Unknown modifier: '{}'. Valid modifiers: ctrl, alt, shift",
                        part
                    )));
                }
            }
        }

        let mut code = self.parse_key_code(key_str)?;
        if code == KeyCode::Tab && modifiers.contains(KeyModifiers::SHIFT) {
            code = KeyCode::BackTab;
        }

        Ok(Event::Key(KeyEvent::new(code, modifiers)))
    }

    /// Parses a key code string into a KeyCode.
    fn parse_key_code(&self, s: &str) -> Result<KeyCode> {
        let code = match s.to_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "backspace" | "bs" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        return Err(ChatError::config(format!(
                            "Unknown key: '{}'. Use single characters or named keys like enter, esc, tab, etc.",
                            s
                        )));
                    }
                }
            }
        };

        Ok(code)
    }

    /// Parses a wait duration like "100ms", "2s", or just "100" (defaults to ms).
    fn parse_wait(&self, value: &str) -> Result<Event> {
        let value = value.to_lowercase();
        let invalid = || ChatError::config(format!("Invalid duration: '{}'", value));

        let duration = if let Some(ms) = value.strip_suffix("ms") {
            Duration::from_millis(ms.parse().map_err(|_| invalid())?)
        } else if let Some(secs) = value.strip_suffix('s') {
            Duration::from_secs(secs.parse().map_err(|_| invalid())?)
        } else {
            Duration::from_millis(value.parse().map_err(|_| invalid())?)
        };

        Ok(Event::Wait(duration))
    }

    /// Parses a resize event like "120x40".
    fn parse_resize(&self, value: &str) -> Result<Event> {
        let (width, height) = value.split_once('x').ok_or_else(|| {
            ChatError::config(format!(
                "Invalid resize format: '{}'. Expected WIDTHxHEIGHT",
                value
            ))
        })?;

        let width: u16 = width
            .parse()
            .map_err(|_| ChatError::config(format!("Invalid width: '{}'", width)))?;
        let height: u16 = height
            .parse()
            .map_err(|_| ChatError::config(format!("Invalid height: '{}'", height)))?;

        Ok(Event::Resize(width, height))
    }

    /// Parses an assertion like "contains:hello", "turns=3" or "state:focus=question".
    fn parse_assert(&self, value: &str) -> Result<Event> {
        if let Some(rest) = value.strip_prefix("turns") {
            return self.parse_turns(rest).map(Event::Assert);
        }

        let (assert_type, rest) = match value.split_once(':') {
            Some((t, r)) => (t.trim().to_lowercase(), r.trim()),
            None => {
                return Err(ChatError::config(format!(
                    "Invalid assertion syntax: '{}'. Expected assert:type:value",
                    value
                )));
            }
        };

        let assertion = match assert_type.as_str() {
            "contains" => Assertion::Contains(rest.to_string()),
            "not-contains" => Assertion::NotContains(rest.to_string()),
            "matches" => Assertion::Matches(rest.to_string()),
            "state" => {
                let (field, value) = rest.split_once('=').ok_or_else(|| {
                    ChatError::config(format!(
                        "Invalid state assertion: '{}'. Expected field=value",
                        rest
                    ))
                })?;
                Assertion::State {
                    field: field.trim().to_string(),
                    value: value.trim().to_string(),
                }
            }
            _ => {
                return Err(ChatError::config(format!(
                    "Unknown assertion type: '{}'. Valid types: contains, not-contains, matches, turns, state",
                    assert_type
                )));
            }
        };

        Ok(Event::Assert(assertion))
    }

    /// Parses the tail of a turns assertion: "=3", ">=2" or "<=4".
    fn parse_turns(&self, rest: &str) -> Result<Assertion> {
        let rest = rest.trim();
        let (op, count) = if let Some(n) = rest.strip_prefix(">=") {
            (Comparison::Ge, n)
        } else if let Some(n) = rest.strip_prefix("<=") {
            (Comparison::Le, n)
        } else if let Some(n) = rest.strip_prefix('=') {
            (Comparison::Eq, n)
        } else {
            return Err(ChatError::config(format!(
                "Invalid turns assertion: 'turns{}'. Expected turns=N, turns>=N or turns<=N",
                rest
            )));
        };

        let count = count
            .trim()
            .parse()
            .map_err(|_| ChatError::config(format!("Invalid turn count: '{}'", count.trim())))?;

        Ok(Assertion::Turns { op, count })
    }
}
