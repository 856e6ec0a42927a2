//! Error types for Askr.

use thiserror::Error;

/// Library-level error type for Askr operations.
#[derive(Error, Debug)]
pub enum AskrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Answer composition failed: {0}")]
    Composer(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Question must not be empty")]
    EmptyInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Askr operations.
pub type Result<T> = std::result::Result<T, AskrError>;
