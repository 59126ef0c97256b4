//! Conversation state owned by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{KeyValueStore, HISTORY_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
            timestamp: None,
        }
    }
}

/// The system turn plus the visible conversation, in order.
///
/// The system turn is never part of `turns()`; `clear` keeps it and only
/// `reset` replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    system: ConversationTurn,
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system: ConversationTurn::system(system_prompt),
            turns: Vec::new(),
        }
    }

    pub fn system(&self) -> &ConversationTurn {
        &self.system
    }

    /// Visible turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// System turn followed by the visible turns.
    pub fn all_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        std::iter::once(&self.system).chain(self.turns.iter())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if turn.role == Role::System {
            tracing::debug!("ignoring extra system turn");
            return;
        }
        self.turns.push(turn);
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::new(Role::User, text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::new(Role::Assistant, text));
    }

    /// Drop the visible conversation, keeping the system turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Start over with a new system prompt.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.system = ConversationTurn::system(system_prompt);
        self.turns.clear();
    }

    /// Persist the visible turns under `chat_history`.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&self.turns)?;
        store.set(HISTORY_KEY, &json)
    }

    /// Rebuild a session from `chat_history`, prepending the given system
    /// prompt. Stored system entries are skipped so it appears exactly once.
    pub fn load(store: &dyn KeyValueStore, system_prompt: impl Into<String>) -> Result<Self> {
        let mut session = Self::new(system_prompt);
        if let Some(json) = store.get(HISTORY_KEY)? {
            let turns: Vec<ConversationTurn> = serde_json::from_str(&json)?;
            session
                .turns
                .extend(turns.into_iter().filter(|t| t.role != Role::System));
        }
        Ok(session)
    }
}
