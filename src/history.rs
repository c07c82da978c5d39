use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Capitalized label used when rendering a turn into a prompt line.
    pub fn capitalized(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shared, append-only conversation transcript.
///
/// All requests in the process append to and snapshot the same transcript.
/// Appends are serialized by the inner mutex; a snapshot is a point-in-time
/// copy, so callers never format a transcript while another request is
/// mid-append.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Mutex<Vec<Turn>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn to the end of the transcript.
    pub fn append(&self, turn: Turn) {
        self.turns.lock().unwrap().push(turn);
    }

    /// A consistent copy of the transcript in insertion order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
