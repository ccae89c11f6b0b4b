//! Answer synthesis: context, prompt, chat call, state update.

use super::context::{AssembledContext, ContextAssembler};
use super::prompt::PromptBuilder;
use crate::chat::ChatCompleter;
use crate::config::Prompts;
use crate::state::{Turn, TurnState};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Number of answer characters included in the success log line.
const LOG_PREVIEW_CHARS: usize = 100;

/// Turns retrieval output into a natural-language answer.
pub struct AnswerSynthesizer {
    chat: Arc<dyn ChatCompleter>,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
}

impl AnswerSynthesizer {
    /// Create a synthesizer around an already constructed chat client.
    pub fn new(chat: Arc<dyn ChatCompleter>, prompts: Prompts) -> Self {
        Self {
            chat,
            assembler: ContextAssembler::default(),
            prompts: PromptBuilder::new(prompts),
        }
    }

    /// Set the maximum number of documents rendered into the context.
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.assembler = ContextAssembler::new(max_documents);
        self
    }

    /// Answer the current question.
    ///
    /// Always returns a state with `answer_text` set. Chat failures are
    /// recorded in `errors` and never propagate.
    #[instrument(
        name = "answer",
        skip(self, state),
        fields(
            conversation_id = %state.conversation_id,
            consignee_codes = ?state.consignee_codes,
            intent = %state.intent,
            hits_count = state.hits.len(),
        )
    )]
    pub async fn answer(&self, mut state: TurnState) -> TurnState {
        let context = match self
            .assembler
            .assemble(&state.hits, state.idx_analytics.as_ref())
        {
            AssembledContext::NoInformation => {
                debug!("No hits or analytics, skipping generation");
                state.answer_text = Some(self.prompts.prompts().answer.no_information.clone());
                return state;
            }
            AssembledContext::Text(text) => text,
        };

        let messages = self
            .prompts
            .build(&state.messages, &context, &state.question_raw);

        match self.chat.complete(&messages).await {
            Ok(response_text) => {
                info!("Generated answer: {}...", preview(&response_text));
                state.messages.push(Turn::assistant(response_text.clone()));
                state.answer_text = Some(response_text);
            }
            Err(e) => {
                error!("LLM generation failed: {}", e);
                state.answer_text = Some(self.prompts.prompts().answer.generation_failed.clone());
                state.errors.push(format!("LLM Error: {}", e));
            }
        }

        state
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}
