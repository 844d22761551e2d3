#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use crate::backend::{ArcBackend, Backend, http_error};
use crate::config::constants::{OPENAI_ENDPOINT, OPENAI_MODEL, TEMPERATURE};
use crate::config::{BackendConfig, user_agent};
use crate::models::ChatTurn;
use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::{fmt::Display, time};
use thiserror::Error;

pub struct OpenAI {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    timeout: Option<time::Duration>,
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn complete(&self, turns: Vec<ChatTurn>) -> Result<String> {
        if turns.is_empty() {
            bail!("no messages to send");
        }
        if self.model.is_empty() {
            bail!("no model is set");
        }

        let completion_req = CompletionRequest {
            model: self.model.clone(),
            messages: turns,
            temperature: self.temperature,
        };

        let mut req = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = &self.api_key {
            req = req.bearer_auth(token);
        }

        log::trace!("Sending completion request: {:?}", completion_req);

        let res = req
            .json(&completion_req)
            .send()
            .await
            .wrap_err("sending completion request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let resp = res.text().await.wrap_err("reading error response")?;
            log::error!("Error response: {}", resp);
            let mut err = serde_json::from_str::<ErrorResponse>(&resp)
                .map(|e| e.error)
                .unwrap_or_else(|_| OpenAIError {
                    message: http_error(http_code),
                    ..Default::default()
                });
            err.http_code = http_code;
            return Err(err.into());
        }

        let res = res
            .json::<CompletionResponse>()
            .await
            .wrap_err("parsing completion response")?;

        if let Some(usage) = &res.usage {
            log::debug!(
                "Completion usage: prompt {}, completion {}, total {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| eyre::eyre!("Invalid response format from OpenAI"))
    }
}

impl From<OpenAI> for ArcBackend {
    fn from(value: OpenAI) -> Self {
        Arc::new(value)
    }
}

impl From<&BackendConfig> for OpenAI {
    fn from(value: &BackendConfig) -> Self {
        let mut openai = OpenAI::default();

        if let Some(endpoint) = value.endpoint.as_deref() {
            openai = openai.with_endpoint(endpoint);
        }

        if let Some(api_key) = value.api_key.as_deref() {
            openai = openai.with_api_key(api_key);
        }

        if let Some(model) = value.model.as_deref() {
            openai = openai.with_model(model);
        }

        if let Some(temperature) = value.temperature {
            openai.temperature = temperature;
        }

        openai
    }
}

impl OpenAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self {
            alias: "OpenAI".to_string(),
            endpoint: OPENAI_ENDPOINT.to_string(),
            api_key: None,
            model: OPENAI_MODEL.to_string(),
            temperature: TEMPERATURE,
            timeout: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatTurn>,
    temperature: f32,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
    #[serde(default)]
    usage: Option<CompletionUsageResponse>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionUsageResponse {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: OpenAIError,
}

#[derive(Default, Error, Debug, Serialize, Deserialize)]
pub struct OpenAIError {
    #[serde(skip)]
    pub http_code: u16,
    pub message: String,
    #[serde(rename = "type", default)]
    pub err_type: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl Display for OpenAIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpenAI error ({}): {}", self.http_code, self.message)
    }
}
