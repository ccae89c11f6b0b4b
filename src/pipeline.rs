//! Question answering pipeline: retrieve, then answer.

use crate::answer::AnswerSynthesizer;
use crate::retrieval::Retriever;
use crate::state::TurnState;
use tracing::instrument;

/// One question-answering turn over the shipment index.
pub struct Pipeline {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl Pipeline {
    pub fn new(retriever: Retriever, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Run retrieval and synthesis for the state's current question.
    ///
    /// The question must already be recorded with [`TurnState::start_turn`].
    #[instrument(name = "turn", skip(self, state), fields(conversation_id = %state.conversation_id))]
    pub async fn run(&self, state: TurnState) -> TurnState {
        let state = self.retriever.retrieve(state).await;
        self.synthesizer.answer(state).await
    }

    /// Start a new turn for `question` on `state` and run it.
    pub async fn ask(&self, state: TurnState, question: &str) -> TurnState {
        self.run(state.start_turn(question)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Prompts, SearchSettings};
    use crate::search::{IndexDocument, MemorySearchIndex, SearchIndex};
    use crate::state::Turn;
    use crate::testing::StubChat;
    use serde_json::json;
    use std::sync::Arc;

    async fn pipeline(chat: Arc<StubChat>) -> Pipeline {
        let index = Arc::new(MemorySearchIndex::new());
        let docs: Vec<IndexDocument> = [
            json!({"doc_id": "1", "carrier": "ACME", "container": "MSKU1", "consignee_codes": ["C1"]}),
            json!({"doc_id": "2", "carrier": "Globex", "container": "MSKU2", "consignee_codes": ["C2"]}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        index.upload(&docs).await.unwrap();

        Pipeline::new(
            Retriever::new(index, &SearchSettings::default()),
            AnswerSynthesizer::new(chat, Prompts::default()),
        )
    }

    #[tokio::test]
    async fn test_multi_turn_conversation() {
        let chat = Arc::new(StubChat::replying("It is with ACME."));
        let pipeline = pipeline(chat.clone()).await;

        let state = TurnState::new("conv-1").with_consignees(vec!["C1".to_string()]);
        let state = pipeline.ask(state, "Who carries MSKU1?").await;
        assert_eq!(state.answer(), "It is with ACME.");

        let state = pipeline.ask(state, "And MSKU1 again?").await;

        assert_eq!(
            state.messages,
            vec![
                Turn::human("Who carries MSKU1?"),
                Turn::assistant("It is with ACME."),
                Turn::human("And MSKU1 again?"),
                Turn::assistant("It is with ACME."),
            ]
        );

        // system, first question, first answer, current prompt
        let request = chat.last_request();
        assert_eq!(request.len(), 4);
        assert!(request[3].content.contains("container: MSKU1"));
        assert!(!request[3].content.contains("MSKU2"));
    }

    #[tokio::test]
    async fn test_out_of_scope_question_gets_fixed_reply() {
        let chat = Arc::new(StubChat::replying("unused"));
        let pipeline = pipeline(chat.clone()).await;

        let state = TurnState::new("conv-2").with_consignees(vec!["C9".to_string()]);
        let state = pipeline.ask(state, "Globex").await;

        assert_eq!(chat.calls(), 0);
        assert!(state.answer().starts_with("I couldn't find any information"));
    }
}
