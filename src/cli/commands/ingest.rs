//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::IngestReport;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::search_only(settings)?;
    let ingestor = orchestrator.ingestor();

    let spinner = Output::spinner(&format!("Ingesting {}...", ingestor.data_dir().display()));
    let report = ingestor.ingest_all().await;
    spinner.finish_and_clear();

    print_report(&report?);
    Ok(())
}

/// Print an ingestion summary.
pub(crate) fn print_report(report: &IngestReport) {
    if report.ingested.is_empty() && report.failed.is_empty() && report.unmoved.is_empty() {
        Output::warning("No record files found in the staging directory.");
        return;
    }

    Output::success(&format!(
        "Uploaded {} documents from {} files",
        report.documents_uploaded,
        report.ingested.len() + report.unmoved.len()
    ));
    for path in &report.ingested {
        Output::list_item(&path.display().to_string());
    }

    if report.skipped > 0 {
        Output::info(&format!("Skipped {} files with unsupported extensions", report.skipped));
    }

    for unmoved in &report.unmoved {
        Output::warning(&format!(
            "{}: uploaded, not moved to processed ({})",
            unmoved.path.display(),
            unmoved.reason
        ));
    }

    for failed in &report.failed {
        Output::error(&format!("{}: {}", failed.path.display(), failed.reason));
    }
}
