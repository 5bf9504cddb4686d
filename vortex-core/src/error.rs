//! Error types for Vortex

use thiserror::Error;

/// Vortex error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// `CGroup` operation failed
    #[error("CGroup error: {message}")]
    CGroup {
        /// Error message
        message: String,
    },

    /// Permission denied
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A kernel-reported RDMA line could not be decoded
    #[error("Malformed RDMA entry {entry:?}: {reason}")]
    MalformedEntry {
        /// The offending line or token
        entry: String,
        /// What was wrong with it
        reason: String,
    },
}

impl Error {
    /// Build a [`Error::MalformedEntry`] from anything string-like
    pub fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Vortex operations
pub type Result<T> = std::result::Result<T, Error>;
