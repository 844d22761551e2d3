pub mod openai;
pub mod relay;

pub use openai::OpenAI;
pub use relay::Relay;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::{
    config::{BackendConfig, verbose},
    models::{BackendKind, ChatTurn},
};
use async_trait::async_trait;
use eyre::Result;
use std::{sync::Arc, time::Duration};

/// Turns a conversation history into the next assistant reply.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Backend {
    fn name(&self) -> &str;
    async fn complete(&self, turns: Vec<ChatTurn>) -> Result<String>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &BackendConfig) -> Result<ArcBackend> {
    let timeout = config.timeout_secs.map(|secs| Duration::from_secs(secs as u64));

    let backend: ArcBackend = match config.kind {
        BackendKind::Relay => {
            let mut relay = Relay::default();
            if let Some(endpoint) = config.endpoint.as_deref() {
                relay = relay.with_endpoint(endpoint);
            }
            if let Some(timeout) = timeout {
                relay = relay.with_timeout(timeout);
            }
            Arc::new(relay)
        }
        BackendKind::OpenAI => {
            let mut openai: OpenAI = config.into();
            if let Some(timeout) = timeout {
                openai = openai.with_timeout(timeout);
            }
            if openai.api_key().is_none() {
                log::warn!("No API key configured for the OpenAI backend");
            }
            Arc::new(openai)
        }
    };

    verbose!("  [+] Using {} backend", backend.name());
    log::debug!("Initialized backend: {}", backend.name());
    Ok(backend)
}

/// Fallback text when a failed response carries no readable reason.
pub(crate) fn http_error(status: u16) -> String {
    format!("HTTP error! status: {}", status)
}
