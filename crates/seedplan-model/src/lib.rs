//! Data model for the seedplan reconciliation pipeline.
//!
//! Holds the row and dataset types, the declared schema, run configuration and
//! the report values every stage returns.

pub mod config;
pub mod error;
pub mod ids;
pub mod record;
pub mod report;
pub mod schema;

pub use config::{
    DEFAULT_DELIMITER_SUBSTITUTE, DEFAULT_LINE_BREAK_MARKER, DELIMITER, DedupMode, LineTerminator,
    PipelineConfig, QUOTE, TiebreakFormat, id_range_end,
};
pub use error::{ModelError, Result};
pub use ids::RegistrationKey;
pub use record::{Dataset, Record};
pub use report::{
    ColumnViolation, DedupReport, FieldChange, NormalizationReport, PipelineReport, Removal,
    RemovalReason, RenumberReport, SchemaIssue, SchemaIssueKind, SchemaReport, TerminatorCensus,
    TerminatorKind, TerminatorViolation, TiebreakWarning, VerifyReport, WriteReport,
};
pub use schema::{ColumnRef, ResolvedColumns, Schema};
