//! Refresh command implementation.

use super::ingest::print_report;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::refresh::RefreshStep;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the refresh command.
pub async fn run_refresh(yes: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if !yes && !confirm(&settings.search.index_name)? {
        Output::info("Aborted.");
        return Ok(());
    }

    let orchestrator = Orchestrator::search_only(settings)?;
    let refresher = orchestrator.refresher();

    println!("{}", style("--- Refreshing Index ---").bold());

    let report = refresher
        .refresh_with_progress(|step| match step {
            RefreshStep::Clearing => {
                println!("Step 1: Clearing existing data from index...");
            }
            RefreshStep::Ingesting => {
                println!("\nStep 2: Starting fresh ingestion from data directory...");
            }
        })
        .await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Refresh failed: {}", e));
            return Err(e.into());
        }
    };

    Output::info(&format!("Cleared {} documents", report.documents_cleared));
    print_report(&report.ingest);

    let elapsed = report.finished_at - report.started_at;
    println!(
        "{}",
        style(format!(
            "\n--- Refresh Complete ({:.1}s) ---",
            elapsed.num_milliseconds() as f64 / 1000.0
        ))
        .bold()
    );

    Ok(())
}

fn confirm(index_name: &str) -> Result<bool> {
    print!(
        "{} This deletes every document in '{}'. Continue? [y/N] ",
        style("!!").yellow().bold(),
        index_name
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
