//! Conversation state owned by the caller and threaded through each query.
//!
//! A [`ConversationState`] is a plain value: whoever holds `&mut` to it is
//! the only one who can run a turn against it. There is no ambient or
//! global conversation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Capitalized label used when rendering history into prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

/// One entry of the dialogue history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Speaker,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Speaker::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Speaker::Assistant, content: content.into() }
    }

    pub fn role(&self) -> Speaker {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// `"User: ..."` / `"Assistant: ..."`.
    pub fn render(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// History, current retrieval context and last topic of one conversation.
///
/// Invariants, upheld by [`ConversationState::commit`] being the only
/// mutator besides [`ConversationState::reset`]:
/// - `history().len()` is always even (user turn then assistant turn);
/// - `current_context()` is `Some` whenever the history is non-empty,
///   provided the first committed turn carried a context (the dialogue
///   manager always retrieves on the first turn).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    history: Vec<Turn>,
    current_context: Option<String>,
    last_topic: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    pub fn last_topic(&self) -> Option<&str> {
        self.last_topic.as_deref()
    }

    /// Number of completed exchanges (user + assistant pairs).
    pub fn exchanges(&self) -> usize {
        self.history.len() / 2
    }

    /// The last `n` turns, oldest first. Fewer if the history is shorter.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Apply a completed exchange in one step.
    ///
    /// Appends the user turn and the assistant turn, replaces the current
    /// context when `new_context` is given, and sets the last topic to
    /// `query` regardless of whether the context changed.
    ///
    /// Callers keep the context invariant by passing `Some` for the first
    /// exchange. A `None` on a state without context is accepted and leaves
    /// the context unset.
    pub fn commit(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
        new_context: Option<String>,
    ) {
        let query = query.into();
        if let Some(context) = new_context {
            self.current_context = Some(context);
        }
        self.history.push(Turn::user(query.clone()));
        self.history.push(Turn::assistant(response));
        self.last_topic = Some(query);
    }

    /// Drop all history, context and topic.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
