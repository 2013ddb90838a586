//! Per-session chat history.

use serde::Serialize;

/// First assistant turn of every session, and the only turn left after a reset.
pub const GREETING: &str = "👋 Hey there! How can I help you today?";

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Label shown above the turn in the chat panel.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat turns of one session.
///
/// Turns are only ever appended; the whole history can be reset back to the
/// greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    turns: Vec<ChatTurn>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates a history holding only the greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![ChatTurn::assistant(GREETING)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::assistant(content));
    }

    /// Drops every turn and starts over with the greeting.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(ChatTurn::assistant(GREETING));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_session_has_greeting() {
        let session = SessionState::new();
        assert_eq!(session.turns(), &[ChatTurn::assistant(GREETING)]);
    }

    #[test]
    fn test_turns_append_in_order() {
        let mut session = SessionState::new();
        session.push_user("How many students are there?");
        session.push_assistant("There are 5 students.");

        let roles = session.turns().iter().map(|t| t.role).collect::<Vec<_>>();
        assert_eq!(
            roles,
            vec![TurnRole::Assistant, TurnRole::User, TurnRole::Assistant]
        );
        assert_eq!(session.last().unwrap().content, "There are 5 students.");
    }

    #[test]
    fn test_reset_leaves_only_greeting() {
        for n in [0, 1, 7, 40] {
            let mut session = SessionState::new();
            for i in 0..n {
                session.push_user(format!("question {i}"));
                session.push_assistant(format!("answer {i}"));
            }
            session.reset();
            assert_eq!(session.len(), 1);
            assert_eq!(session.turns()[0], ChatTurn::assistant(GREETING));
        }
    }

    #[test]
    fn test_role_labels_and_serialization() {
        assert_eq!(TurnRole::User.label(), "You");
        let json = serde_json::to_value(ChatTurn::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }
}
