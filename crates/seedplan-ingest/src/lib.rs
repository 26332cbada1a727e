//! Ingestion of delimited recruitment-planning snapshots.
//!
//! Reads UTF-8 text (optionally with a byte-order mark), tolerates CRLF, LF,
//! CR and mixed terminators, and returns the header plus every non-blank row
//! with its source line. Row widths are left exactly as found; repairing them
//! is the schema reconciler's job.

pub mod csv;
pub mod error;

pub use crate::csv::{MAX_CSV_FILE_SIZE, RawTable, parse_table, read_table, read_table_with_limit};
pub use error::{IngestError, Result};
