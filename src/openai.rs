//! OpenAI client configuration with sensible defaults.

use crate::config::{ChatSettings, AZURE_OPENAI_API_KEY_ENV};
use crate::error::{QnaError, Result};
use async_openai::config::{AzureConfig, OpenAIConfig};
use async_openai::Client;
use std::time::Duration;

/// Default timeout for chat requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Create a public OpenAI client. The key is read from `OPENAI_API_KEY`.
pub fn create_client(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client(timeout)?))
}

/// Create an Azure OpenAI client for the configured deployment.
pub fn create_azure_client(settings: &ChatSettings) -> Result<Client<AzureConfig>> {
    let endpoint = settings
        .azure_endpoint
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| QnaError::Config("chat.azure_endpoint is not set".to_string()))?;

    let deployment = settings
        .azure_deployment
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| QnaError::Config("chat.azure_deployment is not set".to_string()))?;

    let api_key = std::env::var(AZURE_OPENAI_API_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            QnaError::Config(format!("{} not set", AZURE_OPENAI_API_KEY_ENV))
        })?;

    let config = AzureConfig::new()
        .with_api_base(endpoint)
        .with_api_version(&settings.azure_api_version)
        .with_deployment_id(deployment)
        .with_api_key(api_key);

    let timeout = Duration::from_secs(settings.timeout_seconds);
    Ok(Client::with_config(config).with_http_client(http_client(timeout)?))
}
