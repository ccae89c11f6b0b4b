//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::search::{consignee_filter, SearchQuery};
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    consignees: &[String],
    limit: usize,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::search_only(settings)?;

    let mut search_query = SearchQuery::new(query, limit);
    if let Some(filter) = consignee_filter(&orchestrator.settings().search.consignee_field, consignees) {
        search_query = search_query.with_filter(filter);
    }

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.index().search(&search_query).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.hits.len()));

                for hit in &results.hits {
                    Output::search_hit(hit);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
