//! shipqna CLI entry point.

use anyhow::Result;
use clap::Parser;
use shipqna::cli::{commands, Cli, Commands};
use shipqna::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("shipqna={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&config_path, &settings).await?;
        }

        Commands::Ask {
            question,
            consignees,
            intent,
        } => {
            commands::run_ask(question, consignees, intent, settings).await?;
        }

        Commands::Chat { consignees, intent } => {
            commands::run_chat(consignees, intent, settings).await?;
        }

        Commands::Search {
            query,
            consignees,
            limit,
        } => {
            commands::run_search(query, consignees, *limit, settings).await?;
        }

        Commands::Ingest => {
            commands::run_ingest(settings).await?;
        }

        Commands::Refresh { yes } => {
            commands::run_refresh(*yes, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path.clone(), settings)?;
        }
    }

    Ok(())
}
