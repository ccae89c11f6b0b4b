//! Doctor command - verify configuration and service connectivity.

use crate::cli::Output;
use crate::config::{
    ChatProvider, Settings, AZURE_OPENAI_API_KEY_ENV, OPENAI_API_KEY_ENV, SEARCH_API_KEY_ENV,
};
use crate::search::{AzureSearchIndex, SearchIndex};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(config_path: &Path, settings: &Settings) -> anyhow::Result<()> {
    Output::header("shipqna Doctor");
    println!();
    println!("Checking configuration and services...\n");

    let mut checks = Vec::new();

    println!("{}", style("Search Service").bold());
    let search_checks = check_search_config(settings);
    let search_ready = search_checks.iter().all(|c| c.status == CheckStatus::Ok);
    for check in &search_checks {
        check.print();
    }
    checks.extend(search_checks);

    if search_ready {
        let connectivity = check_search_connectivity(settings).await;
        connectivity.print();
        checks.push(connectivity);
    }

    println!();

    println!("{}", style("Chat Service").bold());
    let chat_checks = check_chat_config(settings);
    for check in &chat_checks {
        check.print();
    }
    checks.extend(chat_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using shipqna.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! shipqna is ready to use.");
    }

    Ok(())
}

/// Check the search endpoint and key.
fn check_search_config(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let endpoint = settings.search.endpoint.trim();
    if endpoint.is_empty() {
        results.push(CheckResult::error(
            "Endpoint",
            "not set",
            "Set search.endpoint in the config file",
        ));
    } else {
        results.push(CheckResult::ok(
            "Endpoint",
            &format!("{} (index '{}')", endpoint, settings.search.index_name),
        ));
    }

    match settings.search.resolve_api_key() {
        Some(key) => results.push(CheckResult::ok(
            SEARCH_API_KEY_ENV,
            &format!("configured ({})", mask(&key)),
        )),
        None => results.push(CheckResult::error(
            SEARCH_API_KEY_ENV,
            "not set",
            &format!("Set with: export {}='...'", SEARCH_API_KEY_ENV),
        )),
    }

    results
}

/// Count documents to confirm the index is reachable.
async fn check_search_connectivity(settings: &Settings) -> CheckResult {
    let index = match AzureSearchIndex::from_settings(&settings.search) {
        Ok(index) => index,
        Err(e) => return CheckResult::error("Connectivity", &e.to_string(), "Check search settings"),
    };

    match index.document_count().await {
        Ok(0) => CheckResult::warning(
            "Connectivity",
            "reachable, index is empty",
            "Load records with: shipqna ingest",
        ),
        Ok(count) => CheckResult::ok("Connectivity", &format!("reachable, {} documents", count)),
        Err(e) => CheckResult::error(
            "Connectivity",
            &e.to_string(),
            "Check the endpoint, index name, and API key",
        ),
    }
}

/// Check the chat provider's credentials.
fn check_chat_config(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![CheckResult::ok(
        "Provider",
        &format!("{} ({})", settings.chat.provider, settings.chat.model),
    )];

    match settings.chat.provider {
        ChatProvider::OpenAI => {
            results.push(check_env_key(OPENAI_API_KEY_ENV, std::env::var(OPENAI_API_KEY_ENV).ok()));
        }
        ChatProvider::Azure => {
            results.push(match &settings.chat.azure_endpoint {
                Some(endpoint) => CheckResult::ok("Azure endpoint", endpoint),
                None => CheckResult::error(
                    "Azure endpoint",
                    "not set",
                    "Set chat.azure_endpoint in the config file",
                ),
            });
            results.push(match &settings.chat.azure_deployment {
                Some(deployment) => CheckResult::ok("Azure deployment", deployment),
                None => CheckResult::error(
                    "Azure deployment",
                    "not set",
                    "Set chat.azure_deployment in the config file",
                ),
            });
            results.push(check_env_key(
                AZURE_OPENAI_API_KEY_ENV,
                std::env::var(AZURE_OPENAI_API_KEY_ENV).ok(),
            ));
        }
    }

    results
}

fn check_env_key(name: &str, value: Option<String>) -> CheckResult {
    match value {
        Some(key) if !key.is_empty() => {
            CheckResult::ok(name, &format!("configured ({})", mask(&key)))
        }
        Some(_) => CheckResult::error(name, "empty", &format!("Set with: export {}='...'", name)),
        None => CheckResult::error(name, "not set", &format!("Set with: export {}='...'", name)),
    }
}

/// Check the staging and processed directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.is_dir() {
        let staged = std::fs::read_dir(&data_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .count()
            })
            .unwrap_or(0);
        results.push(CheckResult::ok(
            "Staging directory",
            &format!("{} ({} files staged)", data_dir.display(), staged),
        ));
    } else {
        results.push(CheckResult::warning(
            "Staging directory",
            &format!("{} (missing)", data_dir.display()),
            "Create it and place .json or .jsonl record files there",
        ));
    }

    let processed_dir = settings.processed_dir();
    if processed_dir.is_dir() {
        results.push(CheckResult::ok(
            "Processed directory",
            &format!("{}", processed_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Processed directory",
            &format!("{} (will be created)", processed_dir.display()),
            "Directory will be created on first ingest",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: shipqna config init",
        )
    }
}

/// Show only the ends of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("abcdefghijklmnop"), "abc...mnop");
    }

    #[test]
    fn test_search_config_checks() {
        let mut settings = Settings::default();
        settings.search.api_key = Some("0123456789abcdef".to_string());

        let checks = check_search_config(&settings);
        assert_eq!(checks[0].status, CheckStatus::Error);
        assert_eq!(checks[1].status, CheckStatus::Ok);
        assert!(checks[1].message.contains("012...cdef"));
    }

    #[test]
    fn test_check_env_key() {
        assert_eq!(check_env_key("K", None).status, CheckStatus::Error);
        assert_eq!(check_env_key("K", Some(String::new())).status, CheckStatus::Error);
        assert_eq!(
            check_env_key("K", Some("sk-0123456789".to_string())).status,
            CheckStatus::Ok
        );
    }

    #[test]
    fn test_directories_report_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();

        let mut settings = Settings::default();
        settings.ingest.data_dir = dir.path().display().to_string();
        settings.ingest.processed_dir = dir.path().join("processed").display().to_string();

        let checks = check_directories(&settings);
        assert_eq!(checks[0].status, CheckStatus::Ok);
        assert!(checks[0].message.contains("1 files staged"));
        assert_eq!(checks[1].status, CheckStatus::Warning);
    }
}
