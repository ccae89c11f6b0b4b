//! Stub collaborators shared by unit tests.

use crate::chat::{ChatCompleter, ChatMessage};
use crate::error::{QnaError, Result};
use crate::search::{IndexDocument, SearchIndex, SearchQuery, SearchResults};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Chat stub that records every request and returns a canned reply.
pub struct StubChat {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatCompleter for StubChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(QnaError::Chat)
    }
}

/// Search index whose queries always fail as an unavailable service would.
pub struct FailingIndex;

#[async_trait]
impl SearchIndex for FailingIndex {
    async fn search(&self, _query: &SearchQuery) -> Result<SearchResults> {
        Err(QnaError::Search("docs/search returned 503".to_string()))
    }
    async fn upload(&self, _documents: &[IndexDocument]) -> Result<usize> {
        Ok(0)
    }
    async fn clear_index(&self) -> Result<usize> {
        Ok(0)
    }
    async fn document_count(&self) -> Result<usize> {
        Ok(0)
    }
}
