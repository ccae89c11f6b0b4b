//! Ingestion of staged record files into the search index.
//!
//! Every `.json` / `.jsonl` file in the staging directory is parsed, uploaded
//! in batches, and moved to the processed directory. A file that fails stays
//! where it is and is reported; the remaining files are still ingested. A file
//! whose records were uploaded but which could not be moved is reported apart
//! from the failures, since its documents are already in the index.

use crate::config::Settings;
use crate::error::{QnaError, Result};
use crate::search::{IndexDocument, SearchIndex};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Supported record file extensions.
const RECORD_EXTENSIONS: &[&str] = &["json", "jsonl"];

/// A staged file that could not be ingested.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Files uploaded and moved to the processed directory.
    pub ingested: Vec<PathBuf>,
    /// Files left in the staging directory because of an error.
    pub failed: Vec<FailedFile>,
    /// Files uploaded but left in staging because the move failed.
    pub unmoved: Vec<FailedFile>,
    /// Files ignored because of their extension.
    pub skipped: usize,
    /// Total documents accepted by the index.
    pub documents_uploaded: usize,
}

/// Reads the staging directory and uploads its records.
pub struct Ingestor {
    index: Arc<dyn SearchIndex>,
    data_dir: PathBuf,
    processed_dir: PathBuf,
    key_field: String,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        data_dir: PathBuf,
        processed_dir: PathBuf,
        key_field: &str,
    ) -> Self {
        Self {
            index,
            data_dir,
            processed_dir,
            key_field: key_field.to_string(),
            batch_size: 500,
        }
    }

    /// Create an ingestor from the `[ingest]` and `[search]` settings.
    pub fn from_settings(index: Arc<dyn SearchIndex>, settings: &Settings) -> Self {
        Self::new(
            index,
            settings.data_dir(),
            settings.processed_dir(),
            &settings.search.key_field,
        )
        .with_batch_size(settings.ingest.batch_size)
    }

    /// Set the number of documents per upload request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Ingest every staged file.
    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub async fn ingest_all(&self) -> Result<IngestReport> {
        let files = self.staged_files()?;
        let mut report = IngestReport::default();

        info!("Found {} staged entries", files.len());

        for path in files {
            if !is_record_file(&path) {
                debug!("Skipping {}", path.display());
                report.skipped += 1;
                continue;
            }

            match self.upload_file(&path).await {
                Ok(count) => {
                    report.documents_uploaded += count;
                    match self.move_to_processed(&path) {
                        Ok(()) => {
                            info!("Ingested {} documents from {}", count, path.display());
                            report.ingested.push(path);
                        }
                        Err(e) => {
                            warn!(
                                "Uploaded {} documents from {} but could not move it: {}",
                                count,
                                path.display(),
                                e
                            );
                            report.unmoved.push(FailedFile {
                                path,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to ingest {}: {}", path.display(), e);
                    report.failed.push(FailedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Files directly inside the staging directory, sorted by name.
    fn staged_files(&self) -> Result<Vec<PathBuf>> {
        if !self.data_dir.is_dir() {
            return Err(QnaError::Ingest(format!(
                "Staging directory not found: {}",
                self.data_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn upload_file(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut documents = parse_records(path, &content)?;

        for doc in &mut documents {
            ensure_key(doc, &self.key_field);
        }

        let mut uploaded = 0;
        for batch in documents.chunks(self.batch_size) {
            uploaded += self.index.upload(batch).await?;
        }
        Ok(uploaded)
    }

    fn move_to_processed(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.processed_dir)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| QnaError::Ingest(format!("Not a file path: {}", path.display())))?;
        let target = self.processed_dir.join(file_name);

        if std::fs::rename(path, &target).is_err() {
            // rename fails across filesystems
            std::fs::copy(path, &target)?;
            std::fs::remove_file(path)?;
        }

        debug!("Moved {} to {}", path.display(), target.display());
        Ok(())
    }
}

fn is_record_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RECORD_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse a `.json` (object or array of objects) or `.jsonl` file.
fn parse_records(path: &Path, content: &str) -> Result<Vec<IndexDocument>> {
    let is_jsonl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    let values: Vec<Value> = if is_jsonl {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Value>)
            .collect::<std::result::Result<Vec<Value>, serde_json::Error>>()?
    } else {
        match serde_json::from_str::<Value>(content)? {
            Value::Array(items) => items,
            other => vec![other],
        }
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(doc) => Ok(doc),
            other => Err(QnaError::Ingest(format!(
                "{}: record {} is not an object (got {})",
                path.display(),
                i + 1,
                type_name(&other)
            ))),
        })
        .collect()
}

/// Give a record a string key, generating one when it has none.
fn ensure_key(doc: &mut IndexDocument, key_field: &str) {
    let key = match doc.get(key_field) {
        Some(Value::String(s)) if !s.is_empty() => return,
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    doc.insert(key_field.to_string(), Value::String(key));
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
