//! Error types for the core library

use thiserror::Error;

/// The core error type
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Encoding a snapshot failed
    #[error("Snapshot failed: {0}")]
    SnapshotFailed(Box<str>),

    /// Decoding a snapshot failed
    #[error("Restore failed: {0}")]
    RestoreFailed(Box<str>),

    /// Snapshot was taken from a different type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the caller tried to restore into
        expected: Box<str>,
        /// Type recorded in the snapshot
        found: Box<str>,
    },

    /// Snapshot format cannot be read by the current type
    #[error("Incompatible snapshot format: {found} (supported: {supported})")]
    IncompatibleFormat {
        /// Format recorded in the snapshot
        found: u32,
        /// Format the current type understands
        supported: u32,
    },

    /// A string could not be parsed as a UUID
    #[error("Invalid UUID: {0}")]
    InvalidUuid(Box<str>),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;
