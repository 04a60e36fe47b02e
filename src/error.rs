//! Error types for SparseDev
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for SparseDev operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("out of memory while growing the store")]
    OutOfMemory,

    #[error("buffer transfer fault: {0}")]
    BoundaryFault(String),

    #[error("interrupted while waiting for device access")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Host Errors
    // -------------------------------------------------------------------------
    #[error("device {0} does not exist")]
    NoSuchDevice(usize),

    #[error("handle is not open for {0}")]
    BadMode(&'static str),
}

impl From<std::collections::TryReserveError> for StoreError {
    fn from(_: std::collections::TryReserveError) -> Self {
        StoreError::OutOfMemory
    }
}
