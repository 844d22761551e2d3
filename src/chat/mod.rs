//! Conversation orchestration: owns the in-memory conversations, the
//! active selection and the state of the one outstanding completion.

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

pub mod utils;

pub use utils::generate_title;

use eyre::Result;

use crate::{
    backend::Backend,
    models::{
        ChatError, ChatTurn, Conversation, Message, Role,
        conversation::{FindMessage, sort_by_recent},
    },
    storage::{ArcStore, SaveOutcome},
};

/// A submitted user turn waiting for the backend. Results are applied to
/// the conversation it was issued for, whatever is active by then.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    conversation_id: String,
    turns: Vec<ChatTurn>,
}

impl PendingTurn {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }
}

pub struct Chat {
    store: ArcStore,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl Chat {
    /// Loads the stored history and activates the most recently updated
    /// conversation, if any.
    pub async fn load(store: ArcStore) -> Self {
        let mut conversations = store.load_all().await;
        sort_by_recent(&mut conversations);
        let active_id = conversations.first().map(|c| c.id().to_string());
        log::debug!("Loaded {} conversations", conversations.len());

        Self {
            store,
            conversations,
            active_id,
            loading: false,
            error: None,
        }
    }

    /// All conversations, most recently updated first.
    pub fn conversations(&self) -> Vec<&Conversation> {
        let mut sorted = self.conversations.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id() == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn messages(&self) -> &[Message] {
        self.active().map(|c| c.messages()).unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Creates an empty conversation and makes it active.
    pub async fn new_conversation(&mut self) -> String {
        let id = self.create_conversation().await;
        self.error = None;
        id
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            log::warn!("Cannot select unknown conversation {}", id);
            return false;
        }
        self.active_id = Some(id.to_string());
        self.error = None;
        true
    }

    /// Blank titles and unchanged titles are ignored.
    pub async fn rename(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }

        let Some(convo) = self.get_mut(id) else {
            return false;
        };
        if convo.title() == title {
            return false;
        }
        convo.set_title(title);
        self.persist().await;
        true
    }

    /// Removes a conversation. When it was the active one, the most
    /// recently updated survivor takes over, or a fresh conversation when
    /// nothing is left.
    pub async fn delete(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id() != id);
        if self.conversations.len() == before {
            return false;
        }
        self.persist().await;

        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            self.elect_active().await;
        }
        true
    }

    /// Empties the active conversation once `confirm` agrees. The title is
    /// kept.
    pub async fn clear<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce(&Conversation) -> bool,
    {
        let Some(id) = self.active_id.clone() else {
            return false;
        };
        let Some(convo) = self.get_mut(&id) else {
            return false;
        };
        if !confirm(convo) {
            return false;
        }

        convo.clear_messages();
        self.error = None;
        self.persist().await;
        true
    }

    /// Records the user turn and hands back what has to be sent to the
    /// backend. Nothing changes when the prompt is blank or a request is
    /// already outstanding.
    pub async fn begin_submit(&mut self, prompt: &str) -> Result<PendingTurn, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::Validation("prompt is empty".to_string()));
        }
        if self.loading {
            return Err(ChatError::Busy);
        }

        self.loading = true;
        self.error = None;

        if self.active().is_none() {
            self.create_conversation().await;
        }

        let Some(id) = self.active_id.clone() else {
            self.loading = false;
            return Err(ChatError::Validation("no active conversation".to_string()));
        };

        let pending = {
            let Some(convo) = self.get_mut(&id) else {
                self.loading = false;
                return Err(ChatError::Validation("no active conversation".to_string()));
            };
            if convo.is_empty() {
                convo.set_title(generate_title(prompt));
            }
            convo.append_message(Message::new_user(prompt));
            PendingTurn {
                conversation_id: id,
                turns: convo.build_turns(),
            }
        };

        self.persist().await;
        log::debug!(
            "Submitting {} turns for conversation {}",
            pending.turns.len(),
            pending.conversation_id
        );
        Ok(pending)
    }

    /// Applies the backend outcome of `pending`. A failure leaves the user
    /// turn in place and fills the error slot.
    pub async fn complete_submit(
        &mut self,
        pending: PendingTurn,
        result: Result<String>,
    ) -> Result<(), ChatError> {
        self.loading = false;

        if self.get(&pending.conversation_id).is_none() {
            log::warn!(
                "Dropping completion for deleted conversation {}",
                pending.conversation_id
            );
            return Ok(());
        }

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return Err(self.fail("Received an empty response".to_string())),
            Err(err) => return Err(self.fail(format!("{err:#}"))),
        };

        if let Some(convo) = self.get_mut(&pending.conversation_id) {
            convo.append_message(Message::new_assistant(text));
        }
        self.persist().await;
        Ok(())
    }

    /// Runs a whole user turn against `backend`.
    pub async fn submit(
        &mut self,
        prompt: &str,
        backend: &(dyn Backend + Send + Sync),
    ) -> Result<(), ChatError> {
        let pending = self.begin_submit(prompt).await?;
        let result = backend.complete(pending.turns.clone()).await;
        self.complete_submit(pending, result).await
    }

    /// Re-submits the latest user message of the active conversation.
    /// `None` when there is nothing to retry.
    pub async fn begin_retry(&mut self) -> Result<Option<PendingTurn>, ChatError> {
        self.error = None;

        let Some(prompt) = self
            .active()
            .and_then(|c| c.last_message_of(Some(Role::User)))
            .map(|m| m.content().to_string())
        else {
            log::debug!("Nothing to retry");
            return Ok(None);
        };

        self.begin_submit(&prompt).await.map(Some)
    }

    pub async fn retry(&mut self, backend: &(dyn Backend + Send + Sync)) -> Result<(), ChatError> {
        let Some(pending) = self.begin_retry().await? else {
            return Ok(());
        };
        let result = backend.complete(pending.turns.clone()).await;
        self.complete_submit(pending, result).await
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id() == id)
    }

    fn fail(&mut self, message: String) -> ChatError {
        log::error!("Completion failed: {}", message);
        self.error = Some(message.clone());
        ChatError::Request(message)
    }

    async fn create_conversation(&mut self) -> String {
        let convo = Conversation::new();
        let id = convo.id().to_string();
        self.conversations.insert(0, convo);
        self.active_id = Some(id.clone());
        self.persist().await;
        id
    }

    async fn elect_active(&mut self) {
        let most_recent = self.conversations().first().map(|c| c.id().to_string());
        match most_recent {
            Some(id) => self.active_id = Some(id),
            None => {
                self.create_conversation().await;
            }
        }
    }

    /// Writes the whole collection. A failed write lands in the error slot
    /// and the in-memory state stays as it is.
    async fn persist(&mut self) {
        match self.store.save_all(&self.conversations).await {
            Ok(SaveOutcome::Saved) => {}
            Ok(SaveOutcome::Trimmed { dropped }) => {
                self.conversations
                    .retain(|c| !dropped.iter().any(|id| id == c.id()));
                if self.active().is_none() {
                    self.active_id = self.conversations().first().map(|c| c.id().to_string());
                }
            }
            Err(err) => {
                log::error!("Failed to persist conversations: {}", err);
                self.error = Some(err.to_string());
            }
        }
    }
}
