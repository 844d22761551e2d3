#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{
    config::constants::DEFAULT_TITLE,
    models::{ChatTurn, Message, message::Role},
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    id: String,
    title: String,
    messages: Vec<Message>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets both timestamps. Use [`Conversation::with_updated_at`] afterwards
    /// to move `updated_at` on its own.
    pub fn with_created_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_at = timestamp;
        self.updated_at = timestamp;
        self
    }

    pub fn with_updated_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.updated_at = timestamp;
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.touch();
    }

    /// Bumps `updated_at`. Always moves it forward, even when the stored
    /// value is ahead of the clock.
    pub fn touch(&mut self) {
        let now = chrono::Utc::now();
        let next = self.updated_at + chrono::Duration::nanoseconds(1);
        self.updated_at = now.max(next);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The history as sent to a completion backend: role and content only.
    pub fn build_turns(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(ChatTurn::from).collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sorts most recently updated first.
pub fn sort_by_recent(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
}

pub trait FindMessage {
    fn last_message_of(&self, role: Option<Role>) -> Option<&Message>;
}

impl FindMessage for [Message] {
    fn last_message_of(&self, role: Option<Role>) -> Option<&Message> {
        self.iter()
            .rev()
            .find(|msg| role.is_none_or(|role| msg.role() == role))
    }
}

impl FindMessage for Conversation {
    fn last_message_of(&self, role: Option<Role>) -> Option<&Message> {
        self.messages.last_message_of(role)
    }
}
