//! Error types for the Girder core crate.

use thiserror::Error;

/// Top-level error type for all Girder core operations.
#[derive(Debug, Error)]
pub enum GirderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("invalid data source: {0}")]
    InvalidSource(String),

    #[error("a sync is already running")]
    ConcurrentSync,
}

/// A convenience Result alias that defaults to [`GirderError`].
pub type Result<T> = std::result::Result<T, GirderError>;
