//! Error types for bench-display-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for bench-display-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments
#[derive(Error, Debug)]
pub enum Error {
    /// The user submitted an incomplete or invalid selection
    #[error("{0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
