//! Error types for jogwheel
//!
//! Defines crate-wide error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for jogwheel
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Frame scheduling errors (fatal: playback halts, no retries)
    #[error("Scheduling error: {0}")]
    Scheduling(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using jogwheel Error
pub type Result<T> = std::result::Result<T, Error>;
