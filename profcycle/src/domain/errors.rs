//! Structured error types for profcycle
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to take heap snapshot: {0}")]
    SnapshotFailed(String),

    #[error("No profiling run registered for reference {0}")]
    UnknownReference(String),

    #[error("Failed to export {kind}: {error}")]
    ExportFailed { kind: String, error: String },

    #[error("Failed to write artifact {path}: {error}")]
    WriteFailed { path: String, error: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create archive {path}: {error}")]
    CreateFailed { path: String, error: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
