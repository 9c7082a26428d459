//! Error types for RateCache
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RateError
pub type Result<T> = std::result::Result<T, RateError>;

/// Unified error type for RateCache operations
#[derive(Debug, Error)]
pub enum RateError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Invalid command syntax: {0:?}")]
    InvalidCommandSyntax(String),

    #[error("Invalid command name: {0:?}")]
    InvalidCommandName(String),

    // -------------------------------------------------------------------------
    // Upstream Errors
    // -------------------------------------------------------------------------
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream bad response: {0}")]
    UpstreamBadResponse(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Status Channel Errors
    // -------------------------------------------------------------------------
    #[error("Status file corrupted: {0}")]
    StatusCorrupted(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for RateError {
    fn from(err: rusqlite::Error) -> Self {
        RateError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_status() {
            RateError::UpstreamBadResponse(err.to_string())
        } else {
            RateError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<bincode::Error> for RateError {
    fn from(err: bincode::Error) -> Self {
        RateError::Serialization(err.to_string())
    }
}
