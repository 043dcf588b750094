//! cuesync Error Definitions
//!
//! Tick and query operations on the engine are infallible; only loading
//! inputs and persisting settings can fail.

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid word timing file: {0}")]
    InvalidWordTimings(String),

    #[error("Invalid overlay file: {0}")]
    InvalidOverlays(String),

    // =========================================================================
    // Settings Errors
    // =========================================================================
    #[error("Settings error: {0}")]
    Settings(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;
