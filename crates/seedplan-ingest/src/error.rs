//! Error types for dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before any stage executes.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit.
    #[error("file {path} is {size} bytes, exceeding the {max_size} byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === Encoding Errors ===
    /// Byte-order mark of an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    /// Content is not valid UTF-8.
    #[error("invalid UTF-8 in {path} at byte {valid_up_to}")]
    InvalidUtf8 { path: PathBuf, valid_up_to: usize },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file is empty or has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/seed_planning_data.csv"),
        };
        assert_eq!(
            err.to_string(),
            "CSV file not found: /path/to/seed_planning_data.csv"
        );
    }

    #[test]
    fn test_encoding_error_display() {
        let err = IngestError::UnsupportedEncoding {
            path: PathBuf::from("data.csv"),
            encoding: "UTF-16 LE",
        };
        assert_eq!(err.to_string(), "unsupported encoding UTF-16 LE in data.csv");
    }
}
