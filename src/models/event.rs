use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Conversation, NoticeMessage};

/// What the presentation layer gets told after an action was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Notice(NoticeMessage),

    /// Active conversation after a change, `None` when nothing is active.
    ConversationChanged(Option<Conversation>),
    /// All conversations, most recently updated first.
    ConversationList(Vec<Conversation>),
    ConversationDeleted(String),

    Loading(bool),
    Error(String),
    ErrorCleared,
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
