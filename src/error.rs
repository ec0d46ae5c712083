//! Error types for bench-display

use thiserror::Error;

/// Result type alias for bench-display operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bench-display
#[derive(Error, Debug)]
pub enum Error {
    /// A directory or history request failed (status or transport)
    #[error("Failed to fetch {resource}: {reason}")]
    FetchFailure { resource: String, reason: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A dashboard stage failed; carries the visible error banner text
    #[error("{0}")]
    StageFailed(String),

    #[error(transparent)]
    Core(#[from] bench_display_core::Error),
}

impl Error {
    pub(crate) fn fetch(resource: impl Into<String>, reason: impl ToString) -> Self {
        Error::FetchFailure {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}
