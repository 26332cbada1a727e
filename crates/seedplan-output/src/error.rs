//! Output error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to materialize or install the canonical file.
///
/// A verification failure is not an error; it is reported through
/// [`WriteOutcome::Rejected`](crate::WriteOutcome::Rejected).
#[derive(Debug, Error)]
pub enum OutputError {
    /// File I/O error.
    #[error("failed to {operation} file {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be renamed over the canonical path.
    #[error("failed to replace {target_path} with {temp_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization rejected a record.
    #[error("failed to serialize CSV: {message}")]
    Csv { message: String },

    /// Target path has no file name.
    #[error("output path has no file name: {path}")]
    InvalidTarget { path: PathBuf },
}

impl OutputError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

impl From<csv::Error> for OutputError {
    fn from(err: csv::Error) -> Self {
        Self::Csv {
            message: err.to_string(),
        }
    }
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
