//! Error types for the Anicat client
//!
//! This module defines all error types used throughout the library.
//! AnimeError implements Serialize for Tauri compatibility.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for catalog operations
#[derive(Error, Debug)]
pub enum AnimeError {
    /// HTTP transport failed (connection, TLS, body read)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Requested resource was not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Response body did not match the expected JSON:API shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Empty or otherwise unusable resource identifier
    #[error("Invalid anime ID: {0:?}")]
    InvalidId(String),

    /// Caller supplied an out-of-range or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Profile storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Concurrent writer changed a stored blob first
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// No watchlist with the given id
    #[error("Watchlist not found: {0}")]
    WatchlistNotFound(String),
}

impl AnimeError {
    /// Whether a retry with backoff may succeed (429 and 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            AnimeError::RateLimited => true,
            AnimeError::Status { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AnimeError {
    fn from(err: serde_json::Error) -> Self {
        AnimeError::InvalidResponse(err.to_string())
    }
}

impl From<std::io::Error> for AnimeError {
    fn from(err: std::io::Error) -> Self {
        AnimeError::Storage(err.to_string())
    }
}

/// Serialize AnimeError as a string for Tauri compatibility
impl Serialize for AnimeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, AnimeError>;
