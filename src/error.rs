//! Error types for shipqna.

use thiserror::Error;

/// Library-level error type for shipqna operations.
#[derive(Error, Debug)]
pub enum QnaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search service error: {0}")]
    Search(String),

    #[error("Chat completion failed: {0}")]
    Chat(String),

    #[error("Ingestion failed: {0}")]
    Ingest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for shipqna operations.
pub type Result<T> = std::result::Result<T, QnaError>;
