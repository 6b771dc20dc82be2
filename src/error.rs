//! Error types for Notekeep
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using NotekeepError
pub type Result<T> = std::result::Result<T, NotekeepError>;

/// Unified error type for Notekeep operations
#[derive(Debug, Error)]
pub enum NotekeepError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("invalid bucket key: size={size} level={level}")]
    InvalidKey { size: i64, level: i64 },

    #[error("no bucket for the requested size/security level")]
    NoSuchBucket,

    #[error("no record at the requested position")]
    NoSuchRecord,

    #[error("store capacity exhausted")]
    Capacity,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Authentication Errors
    // -------------------------------------------------------------------------
    #[error("credential rejected")]
    AccessDenied,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("network error: {0}")]
    Network(String),
}
