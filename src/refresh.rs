//! Index refresh: clear the index, then re-ingest the staging directory.
//!
//! The two steps are not transactional. If ingestion fails after a
//! successful clear, the index keeps whatever was uploaded before the
//! failure.

use crate::error::Result;
use crate::ingest::{IngestReport, Ingestor};
use crate::search::SearchIndex;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// Step of a refresh, reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStep {
    Clearing,
    Ingesting,
}

/// Outcome of a refresh.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub documents_cleared: usize,
    pub ingest: IngestReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Sequences clear and re-ingest.
pub struct IndexRefresher {
    index: Arc<dyn SearchIndex>,
    ingestor: Ingestor,
}

impl IndexRefresher {
    pub fn new(index: Arc<dyn SearchIndex>, ingestor: Ingestor) -> Self {
        Self { index, ingestor }
    }

    /// Run the refresh without progress reporting.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        self.refresh_with_progress(|_| {}).await
    }

    /// Run the refresh, calling `on_step` before each step starts.
    ///
    /// Any error from either step is returned immediately; ingestion never
    /// starts unless the clear succeeded.
    #[instrument(skip(self, on_step))]
    pub async fn refresh_with_progress<F>(&self, mut on_step: F) -> Result<RefreshReport>
    where
        F: FnMut(RefreshStep) + Send,
    {
        let started_at = Utc::now();

        on_step(RefreshStep::Clearing);
        let documents_cleared = self.index.clear_index().await?;
        info!("Cleared {} documents", documents_cleared);

        on_step(RefreshStep::Ingesting);
        let ingest = self.ingestor.ingest_all().await?;
        info!(
            "Ingested {} documents from {} files ({} failed, {} not moved)",
            ingest.documents_uploaded,
            ingest.ingested.len(),
            ingest.failed.len(),
            ingest.unmoved.len()
        );

        Ok(RefreshReport {
            documents_cleared,
            ingest,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QnaError;
    use crate::search::{IndexDocument, MemorySearchIndex, SearchQuery, SearchResults};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Index whose clear always fails and which counts uploads.
    struct UnclearableIndex {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl SearchIndex for UnclearableIndex {
        async fn search(&self, _query: &SearchQuery) -> crate::error::Result<SearchResults> {
            Ok(SearchResults::default())
        }
        async fn upload(&self, documents: &[IndexDocument]) -> crate::error::Result<usize> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(documents.len())
        }
        async fn clear_index(&self) -> crate::error::Result<usize> {
            Err(QnaError::Search("docs/index returned 403".to_string()))
        }
        async fn document_count(&self) -> crate::error::Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_index_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shipments.jsonl"),
            "{\"doc_id\": \"new-1\", \"carrier\": \"ACME\"}\n",
        )
        .unwrap();

        let index = Arc::new(MemorySearchIndex::new());
        let stale: IndexDocument = json!({"doc_id": "old-1"}).as_object().cloned().unwrap();
        index.upload(&[stale]).await.unwrap();

        let ingestor = Ingestor::new(
            index.clone(),
            dir.path().to_path_buf(),
            dir.path().join("processed"),
            "doc_id",
        );
        let refresher = IndexRefresher::new(index.clone(), ingestor);

        let mut steps = Vec::new();
        let report = refresher
            .refresh_with_progress(|step| steps.push(step))
            .await
            .unwrap();

        assert_eq!(steps, vec![RefreshStep::Clearing, RefreshStep::Ingesting]);
        assert_eq!(report.documents_cleared, 1);
        assert_eq!(report.ingest.documents_uploaded, 1);
        assert!(report.finished_at >= report.started_at);

        let hits = index.search(&SearchQuery::new("*", 10)).await.unwrap().hits;
        let ids: Vec<&str> = hits.iter().filter_map(|h| h.doc_id()).collect();
        assert_eq!(ids, vec!["new-1"]);
        assert!(dir.path().join("processed/shipments.jsonl").exists());
    }

    #[tokio::test]
    async fn test_clear_failure_aborts_before_ingest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"doc_id": "1"}"#).unwrap();

        let index = Arc::new(UnclearableIndex {
            uploads: AtomicUsize::new(0),
        });
        let ingestor = Ingestor::new(
            index.clone(),
            dir.path().to_path_buf(),
            dir.path().join("processed"),
            "doc_id",
        );

        let mut steps = Vec::new();
        let result = IndexRefresher::new(index.clone(), ingestor)
            .refresh_with_progress(|step| steps.push(step))
            .await;

        assert!(matches!(result, Err(QnaError::Search(_))));
        assert_eq!(steps, vec![RefreshStep::Clearing]);
        assert_eq!(index.uploads.load(Ordering::SeqCst), 0);
        assert!(dir.path().join("a.json").exists());
    }

    #[tokio::test]
    async fn test_ingest_failure_propagates_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(MemorySearchIndex::new());
        let doc: IndexDocument = json!({"doc_id": "old"}).as_object().cloned().unwrap();
        index.upload(&[doc]).await.unwrap();

        let ingestor = Ingestor::new(
            index.clone(),
            dir.path().join("missing"),
            dir.path().join("processed"),
            "doc_id",
        );

        let result = IndexRefresher::new(index.clone(), ingestor).refresh().await;

        assert!(matches!(result, Err(QnaError::Ingest(_))));
        // No rollback: the clear already happened
        assert_eq!(index.document_count().await.unwrap(), 0);
    }
}
