//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: PathBuf, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => {
            if config_path.exists() {
                Output::warning(&format!("Config already exists at {}", config_path.display()));
                return Ok(());
            }
            settings.save_to(&config_path)?;
            Output::success(&format!("Created config at {}", config_path.display()));
            Output::info("Set search.endpoint, then export the API keys it needs.");
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Hide secrets before printing.
fn redacted(mut settings: Settings) -> Settings {
    if settings.search.api_key.is_some() {
        settings.search.api_key = Some("********".to_string());
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipqna/config.toml");

        let mut settings = Settings::default();
        settings.search.index_name = "tracking".to_string();
        run_config(&ConfigAction::Init, path.clone(), settings).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.search.index_name, "tracking");
    }

    #[test]
    fn test_show_hides_api_key() {
        let mut settings = Settings::default();
        settings.search.api_key = Some("secret".to_string());
        let shown = toml::to_string_pretty(&redacted(settings)).unwrap();
        assert!(!shown.contains("secret"));
    }
}
