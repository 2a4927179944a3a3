//! Error types for offline batch processing

use std::path::PathBuf;

use thiserror::Error;

/// Offline processing errors
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Input path '{0}' is not a valid directory")]
    InputNotDirectory(PathBuf),

    #[error("Output path '{0}' exists but is not a directory")]
    OutputNotDirectory(PathBuf),

    #[error("Could not create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open directory {path}: {reason}")]
    ReadDir { path: PathBuf, reason: String },

    #[error("Failed to read audio file: {0}")]
    ReadError(String),

    #[error("Failed to write output file: {0}")]
    WriteError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not start any worker thread: {0}")]
    WorkerSpawn(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl OfflineError {
    /// Errors that abort the whole batch before or instead of processing.
    /// Everything else is scoped to a single file.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InputNotDirectory(_)
                | Self::OutputNotDirectory(_)
                | Self::CreateOutputDir { .. }
                | Self::ReadDir { .. }
                | Self::InvalidConfig(_)
                | Self::WorkerSpawn(_)
        )
    }
}

/// Result type for offline operations
pub type OfflineResult<T> = Result<T, OfflineError>;
