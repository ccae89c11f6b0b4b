//! Per-turn conversation state.
//!
//! Each pipeline step takes a `TurnState` by value and returns the derived
//! state, so data flow between steps stays explicit.

use crate::search::{AnalyticsSummary, SearchHit};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Human,
    Assistant,
}

/// One message of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub kind: TurnKind,
    pub content: String,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            kind: TurnKind::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            kind: TurnKind::Assistant,
            content: content.into(),
        }
    }
}

/// State carried through retrieval and answering for one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnState {
    pub conversation_id: String,
    /// Consignees the caller is authorized to see.
    pub consignee_codes: Vec<String>,
    pub intent: String,
    pub question_raw: String,
    pub hits: Vec<SearchHit>,
    pub idx_analytics: Option<AnalyticsSummary>,
    /// Conversation history, oldest first.
    pub messages: Vec<Turn>,
    pub answer_text: Option<String>,
    pub errors: Vec<String>,
}

impl TurnState {
    /// Create an empty conversation.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Default::default()
        }
    }

    /// Create a conversation with a fresh random id.
    pub fn with_random_id() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Restrict retrieval to the given consignees.
    pub fn with_consignees(mut self, codes: Vec<String>) -> Self {
        self.consignee_codes = codes;
        self
    }

    /// Set the classified intent.
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    /// Replace the conversation history.
    pub fn with_history(mut self, messages: Vec<Turn>) -> Self {
        self.messages = messages;
        self
    }

    /// Begin a new turn: record the question as the latest human turn and
    /// reset everything derived from the previous turn.
    pub fn start_turn(mut self, question: impl Into<String>) -> Self {
        let question = question.into();
        self.messages.push(Turn::human(question.clone()));
        self.question_raw = question;
        self.hits.clear();
        self.idx_analytics = None;
        self.answer_text = None;
        self.errors.clear();
        self
    }

    /// Answer text, or an empty string when the turn has not been answered.
    pub fn answer(&self) -> &str {
        self.answer_text.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_turn_resets_derived_fields() {
        let mut state = TurnState::new("conv-1").start_turn("Q1");
        state.answer_text = Some("A1".to_string());
        state.errors.push("LLM Error: boom".to_string());
        state.messages.push(Turn::assistant("A1"));

        let state = state.start_turn("Q2");

        assert_eq!(state.question_raw, "Q2");
        assert!(state.answer_text.is_none());
        assert!(state.errors.is_empty());
        assert_eq!(
            state.messages,
            vec![Turn::human("Q1"), Turn::assistant("A1"), Turn::human("Q2")]
        );
    }

    #[test]
    fn test_deserialize_minimal_request() {
        let state: TurnState = serde_json::from_str(
            r#"{"question_raw": "Where is PO 42?", "messages": [{"kind": "human", "content": "hi"}]}"#,
        )
        .unwrap();
        assert_eq!(state.question_raw, "Where is PO 42?");
        assert_eq!(state.messages[0].kind, TurnKind::Human);
        assert!(state.idx_analytics.is_none());
    }
}
