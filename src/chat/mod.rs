//! Chat completion abstraction.
//!
//! Answer generation is delegated to a hosted model. The rest of the crate
//! only sees an ordered list of role-tagged messages going in and text
//! coming out.

mod openai;

pub use openai::OpenAIChat;

use crate::config::{ChatProvider, ChatSettings};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for chat completion services.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Send the full message list and return the generated text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Build the chat client selected by configuration.
pub fn create_chat_client(settings: &ChatSettings) -> Result<Arc<dyn ChatCompleter>> {
    let timeout = std::time::Duration::from_secs(settings.timeout_seconds);

    let client: Arc<dyn ChatCompleter> = match settings.provider {
        ChatProvider::OpenAI => Arc::new(OpenAIChat::new(
            crate::openai::create_client(timeout)?,
            &settings.model,
            settings.temperature,
        )),
        ChatProvider::Azure => Arc::new(OpenAIChat::new(
            crate::openai::create_azure_client(settings)?,
            &settings.model,
            settings.temperature,
        )),
    };

    Ok(client)
}
