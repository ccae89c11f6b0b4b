//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod ingest;
mod refresh;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use refresh::run_refresh;
pub use search::run_search;
pub use serve::run_serve;
