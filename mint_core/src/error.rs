//! Error types for the mint_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mint_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A date string was not a valid `YYYY-MM-DD` calendar date
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A record violated its own invariants (e.g. end before start)
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

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

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store error
    #[error("Store error: {0}")]
    Store(String),

    /// Ledger category not present in the catalog
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
