//! shipqna - Conversational Q&A over shipment records
//!
//! Answers natural-language questions about shipments using records retrieved
//! from an Azure AI Search index, restricted to the consignees a caller is
//! authorized to see.
//!
//! # Overview
//!
//! shipqna allows you to:
//! - Ask questions about shipment status, carriers, and containers
//! - Hold multi-turn conversations with history carried between turns
//! - Get counts and facet breakdowns for analytics questions
//! - Load and refresh the search index from staged JSON record files
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `search` - Search index abstraction (Azure AI Search, in-memory)
//! - `chat` - Chat completion abstraction (OpenAI, Azure OpenAI)
//! - `state` - Per-turn conversation state
//! - `retrieval` - Question to index query
//! - `answer` - Context assembly and answer synthesis
//! - `pipeline` - Retrieval followed by answering
//! - `ingest` / `refresh` - Index loading and rebuilding
//! - `orchestrator` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use shipqna::config::Settings;
//! use shipqna::orchestrator::Orchestrator;
//! use shipqna::state::TurnState;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     let pipeline = orchestrator.pipeline()?;
//!
//!     let state = TurnState::with_random_id().with_consignees(vec!["C1".to_string()]);
//!     let state = pipeline.ask(state, "Which of my shipments are delayed?").await;
//!     println!("{}", state.answer());
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod refresh;
pub mod retrieval;
pub mod search;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::{QnaError, Result};
