//! Configuration settings for shipqna.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the search service admin key.
pub const SEARCH_API_KEY_ENV: &str = "AZURE_SEARCH_API_KEY";

/// Environment variable holding the Azure OpenAI key.
pub const AZURE_OPENAI_API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";

/// Environment variable holding the public OpenAI key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub chat: ChatSettings,
    pub ingest: IngestSettings,
    pub answer: AnswerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search service endpoint, e.g. `https://my-service.search.windows.net`.
    pub endpoint: String,
    /// Name of the shipment index.
    pub index_name: String,
    /// REST API version sent with every request.
    pub api_version: String,
    /// Admin key. Falls back to the `AZURE_SEARCH_API_KEY` environment variable.
    pub api_key: Option<String>,
    /// Key field of the index.
    pub key_field: String,
    /// Field holding the consignee codes a record is visible to.
    pub consignee_field: String,
    /// Number of hits requested per question.
    pub top: usize,
    /// Facet fields requested for analytics questions.
    pub facets: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index_name: "shipments".to_string(),
            api_version: "2024-07-01".to_string(),
            api_key: None,
            key_field: "doc_id".to_string(),
            consignee_field: "consignee_codes".to_string(),
            top: 20,
            facets: vec!["shipment_status".to_string(), "carrier".to_string()],
            timeout_seconds: 60,
        }
    }
}

impl SearchSettings {
    /// Resolve the admin key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(SEARCH_API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

/// Chat completion provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    /// Public OpenAI API (default).
    #[default]
    OpenAI,
    /// Azure OpenAI deployment.
    Azure,
}

impl std::str::FromStr for ChatProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ChatProvider::OpenAI),
            "azure" | "azure-openai" => Ok(ChatProvider::Azure),
            _ => Err(format!("Unknown chat provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatProvider::OpenAI => write!(f, "openai"),
            ChatProvider::Azure => write!(f, "azure"),
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Provider (openai, azure).
    pub provider: ChatProvider,
    /// Model name (ignored by Azure, which routes by deployment).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Azure OpenAI resource endpoint.
    pub azure_endpoint: Option<String>,
    /// Azure OpenAI deployment name.
    pub azure_deployment: Option<String>,
    /// Azure OpenAI API version.
    pub azure_api_version: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: ChatProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_version: "2024-06-01".to_string(),
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Staging directory scanned for record files.
    pub data_dir: String,
    /// Directory ingested files are moved to.
    pub processed_dir: String,
    /// Documents per upload request.
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            processed_dir: "data/processed".to_string(),
            batch_size: 500,
        }
    }
}

/// Answer synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Maximum number of hits rendered into the prompt context.
    pub max_context_documents: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            max_context_documents: crate::answer::DEFAULT_MAX_DOCUMENTS,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::QnaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shipqna")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded staging directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.data_dir)
    }

    /// Get the expanded processed directory path.
    pub fn processed_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.processed_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [search]
            endpoint = "https://example.search.windows.net"

            [chat]
            provider = "azure"
            azure_deployment = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(settings.search.endpoint, "https://example.search.windows.net");
        assert_eq!(settings.search.index_name, "shipments");
        assert_eq!(settings.chat.provider, ChatProvider::Azure);
        assert_eq!(settings.answer.max_context_documents, 5);
        assert_eq!(settings.ingest.batch_size, 500);
    }

    #[test]
    fn test_chat_provider_parse() {
        assert_eq!("OpenAI".parse::<ChatProvider>().unwrap(), ChatProvider::OpenAI);
        assert_eq!("azure-openai".parse::<ChatProvider>().unwrap(), ChatProvider::Azure);
        assert!("bedrock".parse::<ChatProvider>().is_err());
    }

    #[test]
    fn test_configured_search_key_wins() {
        let search = SearchSettings {
            api_key: Some("from-config".to_string()),
            ..SearchSettings::default()
        };
        assert_eq!(search.resolve_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.search.top = 7;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.search.top, 7);
    }
}
