//! Prompt construction for answer synthesis.

use crate::chat::ChatMessage;
use crate::config::Prompts;
use crate::state::{Turn, TurnKind};
use std::collections::HashMap;

/// Builds the ordered message list sent to the chat service.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    prompts: Prompts,
}

impl PromptBuilder {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Render the final user message for a question.
    pub fn user_prompt(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.prompts
            .render_with_custom(&self.prompts.answer.user, &vars)
    }

    /// Build `[system, history minus its latest turn, user prompt]`.
    ///
    /// The latest history entry is the question being answered; it is replaced
    /// by the context-augmented user prompt.
    pub fn build(&self, history: &[Turn], context: &str, question: &str) -> Vec<ChatMessage> {
        let system = self
            .prompts
            .render_with_custom(&self.prompts.answer.system, &HashMap::new());

        let earlier = &history[..history.len().saturating_sub(1)];

        let mut messages = Vec::with_capacity(earlier.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(earlier.iter().map(|turn| match turn.kind {
            TurnKind::Human => ChatMessage::user(turn.content.clone()),
            TurnKind::Assistant => ChatMessage::assistant(turn.content.clone()),
        }));
        messages.push(ChatMessage::user(self.user_prompt(context, question)));

        messages
    }
}
