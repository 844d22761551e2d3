use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{Message, message::Role};

/// A single turn as a completion backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role(),
            content: msg.content().to_string(),
        }
    }
}

#[derive(Hash, PartialEq, Eq, Deserialize, Serialize, Debug, Clone, Default)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "relay")]
    Relay,
    #[serde(rename = "openai")]
    OpenAI,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Relay => write!(f, "relay"),
            BackendKind::OpenAI => write!(f, "openai"),
        }
    }
}
