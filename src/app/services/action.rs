#[cfg(test)]
#[path = "action_test.rs"]
mod tests;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::backend::ArcBackend;
use crate::chat::{Chat, PendingTurn};
use crate::models::{Action, ArcEventTx, ChatError, Event};
use crate::{info_notice, warn_notice};
use eyre::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type Completion = (PendingTurn, Result<String>);

/// Applies actions to the chat and runs the outstanding completion in the
/// background, so selecting or renaming keeps working while it is in flight.
pub struct ActionService {
    chat: Chat,
    backend: ArcBackend,
    event_tx: ArcEventTx,
    action_rx: mpsc::UnboundedReceiver<Action>,
    cancel_token: CancellationToken,
    pending_tasks: Arc<AtomicUsize>,

    last_loading: bool,
    last_error: Option<String>,
}

impl ActionService {
    pub fn new(
        chat: Chat,
        backend: ArcBackend,
        action_rx: mpsc::UnboundedReceiver<Action>,
        event_tx: ArcEventTx,
        cancel_token: CancellationToken,
        pending_tasks: Arc<AtomicUsize>,
    ) -> ActionService {
        ActionService {
            chat,
            backend,
            event_tx,
            action_rx,
            cancel_token,
            pending_tasks,
            last_loading: false,
            last_error: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        self.send_list().await?;
        self.send_active().await?;
        self.sync_status().await?;

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    log::debug!("Action service cancelled");
                    return Ok(());
                }

                Some((pending, result)) = done_rx.recv() => {
                    self.handle_completion(pending, result).await?;
                }

                action = self.action_rx.recv() => {
                    let Some(action) = action else {
                        log::debug!("Action channel closed");
                        return Ok(());
                    };
                    self.handle_action(action, &done_tx).await?;
                }
            }
        }
    }

    async fn handle_action(
        &mut self,
        action: Action,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) -> Result<()> {
        log::trace!("Handling action: {:?}", action);
        match action {
            Action::Submit(prompt) => {
                let pending = self.chat.begin_submit(&prompt).await;
                self.start_completion(pending.map(Some), done_tx).await?;
            }

            Action::Retry => {
                let pending = self.chat.begin_retry().await;
                self.start_completion(pending, done_tx).await?;
            }

            Action::Clear => {
                if self.chat.clear(|_| true).await {
                    self.send_active().await?;
                    self.send_list().await?;
                }
            }

            Action::NewConversation => {
                self.chat.new_conversation().await;
                self.send_active().await?;
                self.send_list().await?;
            }

            Action::Select(id) => {
                if self.chat.select(&id) {
                    self.send_active().await?;
                } else {
                    self.event_tx
                        .send(warn_notice!(format!("No conversation {}", id)))
                        .await?;
                }
            }

            Action::Rename(id, title) => {
                if self.chat.rename(&id, &title).await {
                    if self.chat.active_id() == Some(id.as_str()) {
                        self.send_active().await?;
                    }
                    self.send_list().await?;
                }
            }

            Action::Delete(id) => {
                let was_active = self.chat.active_id() == Some(id.as_str());
                if self.chat.delete(&id).await {
                    self.event_tx.send(Event::ConversationDeleted(id)).await?;
                    if was_active {
                        self.send_active().await?;
                    }
                    self.send_list().await?;
                }
            }

            Action::DismissError => self.chat.dismiss_error(),

            Action::List => self.send_list().await?,
        }

        self.sync_status().await
    }

    async fn start_completion(
        &mut self,
        pending: Result<Option<PendingTurn>, ChatError>,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) -> Result<()> {
        let pending = match pending {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                self.event_tx.send(info_notice!("Nothing to retry")).await?;
                return self.resync_loading().await;
            }
            Err(ChatError::Validation(reason)) => {
                log::debug!("Ignoring submission: {}", reason);
                self.event_tx
                    .send(warn_notice!(format!("Nothing was sent: {}", reason)))
                    .await?;
                return self.resync_loading().await;
            }
            Err(ChatError::Busy) => {
                self.event_tx
                    .send(warn_notice!("Please wait for the current reply"))
                    .await?;
                return Ok(());
            }
            Err(err) => {
                log::error!("Failed to start completion: {}", err);
                return Ok(());
            }
        };

        self.send_active().await?;
        self.send_list().await?;

        let backend = Arc::clone(&self.backend);
        let done_tx = done_tx.clone();
        let pending_tasks = Arc::clone(&self.pending_tasks);
        pending_tasks.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let result = backend.complete(pending.turns().to_vec()).await;
            if done_tx.send((pending, result)).is_err() {
                log::warn!("Action service stopped before the completion arrived");
            }
            pending_tasks.fetch_sub(1, Ordering::SeqCst);
        });
        Ok(())
    }

    async fn handle_completion(&mut self, pending: PendingTurn, result: Result<String>) -> Result<()> {
        let conversation_id = pending.conversation_id().to_string();
        let succeeded = self.chat.complete_submit(pending, result).await.is_ok();

        if let Some(convo) = self.chat.get(&conversation_id) {
            if self.chat.active_id() == Some(conversation_id.as_str()) {
                self.send_active().await?;
            } else if succeeded {
                let notice = format!("New reply in \"{}\"", convo.title());
                self.event_tx.send(info_notice!(notice)).await?;
            }
            self.send_list().await?;
        }

        self.sync_status().await
    }

    async fn send_active(&self) -> Result<()> {
        self.event_tx
            .send(Event::ConversationChanged(self.chat.active().cloned()))
            .await?;
        Ok(())
    }

    async fn send_list(&self) -> Result<()> {
        let conversations = self
            .chat
            .conversations()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        self.event_tx
            .send(Event::ConversationList(conversations))
            .await?;
        Ok(())
    }

    /// Front ends may flag a request as pending before it is accepted. A
    /// rejected one has to be answered with the actual state.
    async fn resync_loading(&mut self) -> Result<()> {
        self.last_loading = self.chat.is_loading();
        self.event_tx.send(Event::Loading(self.last_loading)).await?;
        Ok(())
    }

    /// Publishes loading and error changes since the last call.
    async fn sync_status(&mut self) -> Result<()> {
        if self.chat.is_loading() != self.last_loading {
            self.last_loading = self.chat.is_loading();
            self.event_tx.send(Event::Loading(self.last_loading)).await?;
        }

        let error = self.chat.error().map(str::to_string);
        if error != self.last_error {
            self.last_error = error.clone();
            let event = match error {
                Some(error) => Event::Error(error),
                None => Event::ErrorCleared,
            };
            self.event_tx.send(event).await?;
        }
        Ok(())
    }
}
