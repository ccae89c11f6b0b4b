//! Pre-flight checks before remote operations.
//!
//! Validates that endpoints and credentials are configured before starting
//! operations that would otherwise fail midway.

use crate::config::{
    ChatProvider, Settings, AZURE_OPENAI_API_KEY_ENV, OPENAI_API_KEY_ENV, SEARCH_API_KEY_ENV,
};
use crate::error::{QnaError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Asking questions requires the search index and the chat service.
    Ask,
    /// Search requires the search index.
    Search,
    /// Ingest and refresh require the search index.
    Ingest,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_search(settings)?;
            check_chat(settings)?;
        }
        Operation::Search | Operation::Ingest => {
            check_search(settings)?;
        }
    }
    Ok(())
}

/// Check that the search endpoint and key are configured.
fn check_search(settings: &Settings) -> Result<()> {
    if settings.search.endpoint.trim().is_empty() {
        return Err(QnaError::Config(
            "search.endpoint is not set. Add it with: shipqna config init, then edit the file"
                .to_string(),
        ));
    }
    if settings.search.resolve_api_key().is_none() {
        return Err(QnaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            SEARCH_API_KEY_ENV, SEARCH_API_KEY_ENV
        )));
    }
    Ok(())
}

/// Check that the chat provider has what it needs.
fn check_chat(settings: &Settings) -> Result<()> {
    match settings.chat.provider {
        ChatProvider::OpenAI => check_env_key(OPENAI_API_KEY_ENV, "sk-..."),
        ChatProvider::Azure => {
            if settings.chat.azure_endpoint.is_none() {
                return Err(QnaError::Config(
                    "chat.azure_endpoint is required for the azure provider".to_string(),
                ));
            }
            if settings.chat.azure_deployment.is_none() {
                return Err(QnaError::Config(
                    "chat.azure_deployment is required for the azure provider".to_string(),
                ));
            }
            check_env_key(AZURE_OPENAI_API_KEY_ENV, "...")
        }
    }
}

fn check_env_key(name: &str, example: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(QnaError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            name, name, example
        ))),
        Err(_) => Err(QnaError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            name, name, example
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_requires_endpoint() {
        let result = check(Operation::Search, &Settings::default());
        assert!(matches!(result, Err(QnaError::Config(msg)) if msg.contains("search.endpoint")));
    }

    #[test]
    fn test_search_passes_with_configured_key() {
        let mut settings = Settings::default();
        settings.search.endpoint = "https://example.search.windows.net".to_string();
        settings.search.api_key = Some("key".to_string());
        assert!(check(Operation::Ingest, &settings).is_ok());
    }

    #[test]
    fn test_azure_chat_requires_endpoint() {
        let mut settings = Settings::default();
        settings.search.endpoint = "https://example.search.windows.net".to_string();
        settings.search.api_key = Some("key".to_string());
        settings.chat.provider = ChatProvider::Azure;

        let result = check(Operation::Ask, &settings);
        assert!(matches!(result, Err(QnaError::Config(msg)) if msg.contains("azure_endpoint")));
    }
}
