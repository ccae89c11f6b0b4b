//! Configuration module for shipqna.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    AnswerSettings, ChatProvider, ChatSettings, GeneralSettings, IngestSettings, PromptSettings,
    SearchSettings, Settings, AZURE_OPENAI_API_KEY_ENV, OPENAI_API_KEY_ENV, SEARCH_API_KEY_ENV,
};
