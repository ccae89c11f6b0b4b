//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::state::TurnState;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    consignees: &[String],
    intent: &str,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if consignees.is_empty() {
        Output::warning("No --consignee given; the search is not scoped to any consignee.");
    }

    let orchestrator = Orchestrator::new(settings)?;
    let pipeline = orchestrator.pipeline()?;

    let state = TurnState::with_random_id()
        .with_consignees(consignees.to_vec())
        .with_intent(intent);

    let spinner = Output::spinner("Searching shipments...");
    let state = pipeline.ask(state, question).await;
    spinner.finish_and_clear();

    println!("\n{}\n", state.answer());

    for error in &state.errors {
        Output::warning(error);
    }

    if !state.hits.is_empty() {
        Output::header("Matching records");
        let shown = orchestrator.settings().answer.max_context_documents.max(1);
        for hit in state.hits.iter().take(shown) {
            Output::search_hit(hit);
        }
    }

    Ok(())
}
