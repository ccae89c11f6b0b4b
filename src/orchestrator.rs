//! Component wiring for shipqna.
//!
//! Builds the search index, chat client, and prompts from settings once, and
//! hands out the pipeline, ingestor, and refresher that share them.

use crate::answer::AnswerSynthesizer;
use crate::chat::{create_chat_client, ChatCompleter};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::pipeline::Pipeline;
use crate::refresh::IndexRefresher;
use crate::retrieval::Retriever;
use crate::search::{AzureSearchIndex, SearchIndex};
use std::sync::Arc;
use tracing::info;

/// Owns the shared collaborators of every operation.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    index: Arc<dyn SearchIndex>,
    chat: Option<Arc<dyn ChatCompleter>>,
}

impl Orchestrator {
    /// Create an orchestrator for question answering.
    ///
    /// Requires both the search service and the chat service to be configured.
    pub fn new(settings: Settings) -> Result<Self> {
        let mut orchestrator = Self::search_only(settings)?;
        let chat = create_chat_client(&orchestrator.settings.chat)?;
        info!(
            "Using {} chat model {}",
            orchestrator.settings.chat.provider, orchestrator.settings.chat.model
        );
        orchestrator.chat = Some(chat);
        Ok(orchestrator)
    }

    /// Create an orchestrator without a chat client.
    ///
    /// Enough for search, ingestion, and refresh.
    pub fn search_only(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let index: Arc<dyn SearchIndex> = Arc::new(AzureSearchIndex::from_settings(&settings.search)?);
        info!(
            "Using search index '{}' at {}",
            settings.search.index_name, settings.search.endpoint
        );

        Ok(Self {
            settings,
            prompts,
            index,
            chat: None,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        index: Arc<dyn SearchIndex>,
        chat: Arc<dyn ChatCompleter>,
    ) -> Self {
        Self {
            settings,
            prompts,
            index,
            chat: Some(chat),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the search index.
    pub fn index(&self) -> Arc<dyn SearchIndex> {
        self.index.clone()
    }

    /// Build the question answering pipeline.
    pub fn pipeline(&self) -> Result<Pipeline> {
        let chat = self.chat.clone().ok_or_else(|| {
            crate::error::QnaError::Config("Chat client is not configured".to_string())
        })?;

        let retriever = Retriever::new(self.index.clone(), &self.settings.search);
        let synthesizer = AnswerSynthesizer::new(chat, self.prompts.clone())
            .with_max_documents(self.settings.answer.max_context_documents);

        Ok(Pipeline::new(retriever, synthesizer))
    }

    /// Build an ingestor for the configured staging directory.
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::from_settings(self.index.clone(), &self.settings)
    }

    /// Build a refresher that clears the index and re-ingests.
    pub fn refresher(&self) -> IndexRefresher {
        IndexRefresher::new(self.index.clone(), self.ingestor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QnaError;
    use crate::search::MemorySearchIndex;
    use crate::state::TurnState;
    use crate::testing::StubChat;

    #[test]
    fn test_search_only_requires_endpoint() {
        let result = Orchestrator::search_only(Settings::default());
        assert!(matches!(result, Err(QnaError::Config(_))));
    }

    #[test]
    fn test_search_only_has_no_pipeline() {
        let mut settings = Settings::default();
        settings.search.endpoint = "https://example.search.windows.net".to_string();
        settings.search.api_key = Some("test-key".to_string());

        let orchestrator = Orchestrator::search_only(settings).unwrap();
        assert!(matches!(orchestrator.pipeline(), Err(QnaError::Config(_))));
    }

    #[tokio::test]
    async fn test_with_components_wires_pipeline() {
        let mut settings = Settings::default();
        settings.answer.max_context_documents = 1;
        let chat = Arc::new(StubChat::replying("done"));

        let orchestrator = Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(MemorySearchIndex::new()),
            chat.clone(),
        );

        let state = orchestrator
            .pipeline()
            .unwrap()
            .ask(TurnState::new("c"), "anything")
            .await;

        // Empty index: fixed reply, no chat call
        assert_eq!(chat.calls(), 0);
        assert!(state.answer_text.is_some());
    }
}
