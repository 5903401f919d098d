//! Error types for agc-hist.

use thiserror::Error;

/// agc-hist error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file missing, unreadable, rename failed).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container file exists but does not parse as a container ("zombie").
    #[error("corrupt container {path}: {source}")]
    Corrupt {
        /// Path of the offending file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Embedded `AGC_metadata` blob failed to decode.
    ///
    /// Recoverable: callers may treat this as absent metadata and fall back
    /// to the integral-ratio scaling path.
    #[error("metadata decode error: {0}")]
    MetadataDecode(#[source] serde_json::Error),

    /// Input manifest failed to parse.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Structural validation error (e.g. mismatched bin array lengths).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
