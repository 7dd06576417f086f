//! Error types for the glyco_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for glyco_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Image decoding/encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected input at the ingestion boundary
    #[error("Invalid reading: {0}")]
    Validation(String),

    /// Reading store could not be read or written
    #[error("Store error: {0}")]
    Store(String),

    /// Report document could not be assembled
    #[error("Report error: {0}")]
    Report(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures the caller may retry as-is (store and transport faults).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Store(_))
    }

    /// True for input rejected before it reached the engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
