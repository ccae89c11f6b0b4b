//! Answer synthesis over retrieved shipment records.
//!
//! Retrieved hits and analytics are rendered into a context block, combined
//! with the conversation history into a chat prompt, and sent to the chat
//! service. The resulting text becomes the turn's answer.

pub mod context;
pub mod prompt;
mod synthesizer;

pub use context::{AssembledContext, ContextAssembler, DEFAULT_MAX_DOCUMENTS};
pub use prompt::PromptBuilder;
pub use synthesizer::AnswerSynthesizer;
