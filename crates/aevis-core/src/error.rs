//! Error types for the AEVIS visibility pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using AEVIS's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for visibility pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Keyword not found
    #[error("Keyword not found: {0}")]
    KeywordNotFound(Uuid),

    /// Project not found
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    /// A check run is already in progress for the keyword
    #[error("Check already running for keyword: {0}")]
    AlreadyRunning(Uuid),

    /// Engine adapter call failed or timed out.
    ///
    /// Recovered inside the orchestrator (retry, then degrade); only
    /// surfaced directly when an adapter is invoked outside a run.
    #[error("Engine adapter error: {0}")]
    EngineAdapter(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed (no resolved requester)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
