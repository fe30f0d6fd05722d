//! Conversation types.

use serde::{Deserialize, Serialize};

/// Who a turn is attributed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    /// Label used by terminal renderers
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Agent => "Agent",
        }
    }
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new agent turn
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only sequence of turns for one controller lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the conversation with `turn` added at the end.
    #[must_use]
    pub fn append(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert!(conversation.last().is_none());
    }

    #[test]
    fn test_append_preserves_order_without_dedup() {
        let conversation = Conversation::new()
            .append(Turn::user("hi"))
            .append(Turn::agent("hello"))
            .append(Turn::user("hi"));

        let contents: Vec<&str> = conversation.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["hi", "hello", "hi"]);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().map(Turn::role), Some(Role::User));
    }

    #[test]
    fn test_append_leaves_earlier_snapshot_untouched() {
        let first = Conversation::new().append(Turn::user("one"));
        let second = first.clone().append(Turn::agent("two"));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_serializes_as_list_of_turns() {
        let conversation = Conversation::new().append(Turn::agent("ok"));
        let json = serde_json::to_value(&conversation).unwrap();

        assert_eq!(json, serde_json::json!([{ "role": "agent", "content": "ok" }]));
    }
}
