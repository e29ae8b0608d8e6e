//! Typed errors for the fetch and load stages.

use thiserror::Error;

/// Errors raised while requesting a page of listings.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure or unreadable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The body was not the expected JSON shape
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Errors raised by a warehouse backend.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    /// The configured key column is not a column of the destination table
    #[error("key column {column} not found in {table}")]
    MissingKeyColumn { table: String, column: String },

    /// The configured key column does not name an integer field of the batch
    #[error("key column {column} is not an integer field of the batch")]
    KeyNotInBatch { column: String },

    /// A batch value cannot be stored in the destination column
    #[error("column {column} expects {expected}, got {value}")]
    TypeMismatch {
        column: String,
        expected: String,
        value: String,
    },

    #[error("warehouse unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),

    #[error("no areas configured")]
    NoAreas,
}
