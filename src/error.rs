//! Error types for Curio.

use thiserror::Error;

/// Library-level error type for Curio operations.
#[derive(Error, Debug)]
pub enum CurioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("{0}")]
    Calculation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Curio operations.
pub type Result<T> = std::result::Result<T, CurioError>;
