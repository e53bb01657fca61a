//! Core error types for studycycle-core.
//!
//! Nothing in the engine is user-fatal: transport failures on the debounced
//! write channels are swallowed by the sync layer, and a malformed cache
//! falls back to default state. The types below exist for the callers that
//! do want to observe a failure (CLI, direct store access).

use thiserror::Error;

/// Core error type for studycycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Remote store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The configured base URL could not be parsed
    #[error("Invalid store base URL: {0}")]
    InvalidBaseUrl(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code from the store
    #[error("Store returned status {0}")]
    Status(u16),

    /// Response body did not match the expected document shape
    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

/// Local cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache directory could not be determined or created
    #[error("Cache directory unavailable: {0}")]
    Dir(String),

    /// Reading or writing the cache blob failed
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache blob could not be serialized
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
