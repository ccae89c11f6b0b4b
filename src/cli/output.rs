//! CLI output formatting utilities.

use crate::search::SearchHit;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Fields shown in a search result line, in order.
const SUMMARY_FIELDS: &[&str] = &["shipment_status", "carrier", "container_number", "eta"];

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a search hit.
    pub fn search_hit(hit: &SearchHit) {
        let score = hit
            .score()
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "\n{} {} (score: {})",
            style(">>").green(),
            style(hit.doc_id().unwrap_or("?")).bold(),
            score
        );

        let summary: Vec<String> = SUMMARY_FIELDS
            .iter()
            .filter_map(|field| {
                hit.get(field)
                    .filter(|v| !v.is_null())
                    .map(|v| format!("{}: {}", field, crate::answer::context::render_value(v)))
            })
            .collect();
        if !summary.is_empty() {
            println!("   {}", summary.join(", "));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
