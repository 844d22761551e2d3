#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::constants::MAX_CONVERSATIONS,
    models::{Conversation, SlotError, StorageError, conversation::sort_by_recent},
};

use super::ArcSlot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The medium ran out of space and only the most recently updated
    /// conversations were written. Holds the ids that did not make it.
    Trimmed { dropped: Vec<String> },
}

/// Persists the whole conversation collection as one JSON array in a slot.
pub struct ConversationStore {
    slot: ArcSlot,
    max_conversations: usize,
}

pub type ArcStore = Arc<ConversationStore>;

impl ConversationStore {
    pub fn new(slot: ArcSlot) -> Self {
        Self {
            slot,
            max_conversations: MAX_CONVERSATIONS,
        }
    }

    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations.max(1);
        self
    }

    pub fn max_conversations(&self) -> usize {
        self.max_conversations
    }

    /// Never fails: an unreadable or malformed slot reads as an empty history.
    pub async fn load_all(&self) -> Vec<Conversation> {
        let blob = match self.slot.read().await {
            Ok(Some(blob)) => blob,
            Ok(None) => return vec![],
            Err(err) => {
                log::error!("Failed to read conversations from storage: {}", err);
                return vec![];
            }
        };
        decode(&blob)
    }

    pub async fn save_all(
        &self,
        conversations: &[Conversation],
    ) -> Result<SaveOutcome, StorageError> {
        let blob = encode(conversations)?;
        let err = match self.slot.write(blob).await {
            Ok(()) => {
                log::debug!("Saved {} conversations", conversations.len());
                return Ok(SaveOutcome::Saved);
            }
            Err(err) => err,
        };

        if !matches!(err, SlotError::QuotaExceeded) {
            log::error!("Failed to save conversations to storage: {}", err);
            return Err(err.into());
        }

        if conversations.len() <= self.max_conversations {
            log::error!(
                "Storage quota exceeded with {} conversations",
                conversations.len()
            );
            return Err(StorageError::QuotaExceeded);
        }

        let mut kept = conversations.to_vec();
        sort_by_recent(&mut kept);
        let dropped = kept
            .split_off(self.max_conversations)
            .into_iter()
            .map(|c| c.id().to_string())
            .collect::<Vec<_>>();

        if let Err(err) = self.slot.write(encode(&kept)?).await {
            log::error!(
                "Storage quota exceeded, retry with {} conversations failed: {}",
                kept.len(),
                err
            );
            return Err(StorageError::QuotaExceeded);
        }

        log::warn!(
            "Storage quota exceeded. Kept only the {} most recent conversations, dropped {}",
            kept.len(),
            dropped.len()
        );
        Ok(SaveOutcome::Trimmed { dropped })
    }

    /// Replaces the conversation with the same id or appends it.
    pub async fn upsert(&self, conversation: Conversation) -> Result<SaveOutcome, StorageError> {
        let mut conversations = self.load_all().await;
        match conversations
            .iter_mut()
            .find(|c| c.id() == conversation.id())
        {
            Some(existing) => *existing = conversation,
            None => conversations.push(conversation),
        }
        self.save_all(&conversations).await
    }

    pub async fn remove(&self, id: &str) -> Result<SaveOutcome, StorageError> {
        let mut conversations = self.load_all().await;
        conversations.retain(|c| c.id() != id);
        self.save_all(&conversations).await
    }
}

pub(crate) fn encode(conversations: &[Conversation]) -> Result<String, StorageError> {
    serde_json::to_string(conversations).map_err(|err| StorageError::Serialize(err.to_string()))
}

pub(crate) fn decode(blob: &str) -> Vec<Conversation> {
    if blob.trim().is_empty() {
        return vec![];
    }

    let value = match serde_json::from_str::<serde_json::Value>(blob) {
        Ok(value) => value,
        Err(err) => {
            log::error!("Failed to parse stored conversations: {}", err);
            return vec![];
        }
    };

    if !value.is_array() {
        log::warn!("Invalid data format in storage, starting with an empty history");
        return vec![];
    }

    match serde_json::from_value::<Vec<Conversation>>(value) {
        Ok(conversations) => dedup_by_id(conversations),
        Err(err) => {
            log::error!("Failed to load stored conversations: {}", err);
            vec![]
        }
    }
}

/// Keeps the most recently updated record per id, in first-seen order.
fn dedup_by_id(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Conversation> = Vec::with_capacity(conversations.len());

    for convo in conversations {
        match index.get(convo.id()) {
            Some(&pos) => {
                log::warn!("Duplicate conversation id {} in storage", convo.id());
                if convo.updated_at() > unique[pos].updated_at() {
                    unique[pos] = convo;
                }
            }
            None => {
                index.insert(convo.id().to_string(), unique.len());
                unique.push(convo);
            }
        }
    }
    unique
}
