//! CLI module for shipqna.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// shipqna - Conversational Q&A over shipment records
///
/// Answers questions about shipments from an Azure AI Search index, scoped to
/// the consignees the caller may see.
#[derive(Parser, Debug)]
#[command(name = "shipqna")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check configuration and service connectivity
    Doctor,

    /// Ask a single question about your shipments
    Ask {
        /// The question to ask
        question: String,

        /// Consignee code the answer is scoped to (repeatable)
        #[arg(short = 'C', long = "consignee")]
        consignees: Vec<String>,

        /// Query intent; "analytics" also requests counts and facets
        #[arg(short, long, default_value = "")]
        intent: String,
    },

    /// Start an interactive chat session
    Chat {
        /// Consignee code the session is scoped to (repeatable)
        #[arg(short = 'C', long = "consignee")]
        consignees: Vec<String>,

        /// Query intent for every turn of the session
        #[arg(short, long, default_value = "")]
        intent: String,
    },

    /// Search the shipment index without generating an answer
    Search {
        /// Search query
        query: String,

        /// Consignee code the search is scoped to (repeatable)
        #[arg(short = 'C', long = "consignee")]
        consignees: Vec<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Upload staged record files to the index
    Ingest,

    /// Clear the index and re-ingest the staging directory
    Refresh {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_consignees() {
        let cli = Cli::try_parse_from([
            "shipqna", "-v", "ask", "Where is MSKU1?", "-C", "C1", "--consignee", "C2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask {
                question,
                consignees,
                intent,
            } => {
                assert_eq!(question, "Where is MSKU1?");
                assert_eq!(consignees, vec!["C1", "C2"]);
                assert_eq!(intent, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_refresh() {
        let cli = Cli::try_parse_from(["shipqna", "refresh", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Refresh { yes: true }));
    }
}
