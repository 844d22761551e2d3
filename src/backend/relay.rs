#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;

use crate::backend::{ArcBackend, Backend, http_error};
use crate::config::{constants::RELAY_ENDPOINT, user_agent};
use crate::models::ChatTurn;
use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time};
use thiserror::Error;

/// Client of a completion service: posts the message history and expects
/// `{"message": ...}` back, or `{"error": ...}` on failure.
pub struct Relay {
    endpoint: String,
    timeout: Option<time::Duration>,
}

#[async_trait]
impl Backend for Relay {
    fn name(&self) -> &str {
        "relay"
    }

    async fn complete(&self, turns: Vec<ChatTurn>) -> Result<String> {
        if turns.is_empty() {
            bail!("no messages to send");
        }

        let mut req = reqwest::Client::new()
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        log::trace!("Sending relay request with {} messages", turns.len());

        let res = req
            .json(&ChatRequest { messages: turns })
            .send()
            .await
            .wrap_err("sending chat request")?;

        let status = res.status();
        let body = res.text().await.wrap_err("reading chat response")?;

        if !status.is_success() {
            log::error!("Error response ({}): {}", status.as_u16(), body);
            let reason = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(ErrorResponse::reason)
                .unwrap_or_else(|| http_error(status.as_u16()));
            return Err(RelayError(reason).into());
        }

        let data = serde_json::from_str::<ChatResponse>(&body)
            .wrap_err(format!("parsing chat response: {}", body))?;

        if let Some(err) = data.error.filter(|e| !e.is_empty()) {
            return Err(RelayError(err).into());
        }

        match data.message {
            Some(message) if !message.trim().is_empty() => Ok(message),
            _ => Err(RelayError("Invalid response format from completion service".into()).into()),
        }
    }
}

impl From<Relay> for ArcBackend {
    fn from(value: Relay) -> Self {
        Arc::new(value)
    }
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self {
            endpoint: RELAY_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatTurn>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponse {
    fn reason(self) -> Option<String> {
        let present = |reason: &String| !reason.is_empty();
        self.message.filter(present).or(self.error.filter(present))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RelayError(pub String);
