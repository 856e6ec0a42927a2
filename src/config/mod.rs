//! Configuration module for Askr.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, LanguagePrompts, Prompts};
pub use settings::{
    CacheSettings, ComposerSettings, EmbeddingSettings, GeneralSettings, MemorySettings,
    PromptSettings, RetrievalProvider, RetrievalSettings, ServerSettings, Settings,
};
