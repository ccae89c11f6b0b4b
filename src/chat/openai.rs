//! Chat completions through `async-openai`.

use super::{ChatCompleter, ChatMessage, Role};
use crate::error::{QnaError, Result};
use async_openai::config::Config;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-compatible chat client (public OpenAI or Azure OpenAI).
pub struct OpenAIChat<C: Config> {
    client: Client<C>,
    model: String,
    temperature: f32,
}

impl<C: Config> OpenAIChat<C> {
    /// Wrap a configured client.
    pub fn new(client: Client<C>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| QnaError::Chat(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| QnaError::Chat(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| QnaError::Chat(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl<C> ChatCompleter for OpenAIChat<C>
where
    C: Config + Send + Sync + 'static,
{
    #[instrument(skip(self, messages), fields(model = %self.model, count = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| QnaError::Chat(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            QnaError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| QnaError::Chat("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received {} characters", answer.len());
        Ok(answer)
    }
}
