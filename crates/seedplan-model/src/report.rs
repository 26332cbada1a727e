//! Reports returned by each pipeline stage.
//!
//! Stages never log-and-forget a row-level decision: every padding, truncation,
//! dedup removal and field rewrite lands in one of these values so the caller
//! can present or persist it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::LineTerminator;
use crate::record::Record;

// === Ingest ===

/// Line terminators counted in raw input, outside and inside quoted fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminatorCensus {
    pub crlf: usize,
    pub lf: usize,
    pub cr: usize,
}

impl TerminatorCensus {
    /// True when more than one terminator style was seen.
    pub fn is_mixed(&self) -> bool {
        [self.crlf, self.lf, self.cr]
            .iter()
            .filter(|count| **count > 0)
            .count()
            > 1
    }

    pub fn total(&self) -> usize {
        self.crlf + self.lf + self.cr
    }
}

// === Schema reconciliation ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaIssueKind {
    /// Short row padded with empty fields on the right.
    Padded { found: usize, added: usize },
    /// Long row cut to the schema width; the discarded tail is kept for audit.
    Truncated {
        found: usize,
        discarded_count: usize,
        discarded: Vec<String>,
    },
    /// Input header differed from the canonical header and was replaced.
    HeaderReplaced { found: Vec<String> },
    /// Input header had the wrong width and no canonical header was configured.
    HeaderResized { found: usize, expected: usize },
    /// Row with only blank fields, removed at ingest.
    BlankRowDropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// 1-based source line.
    pub line: usize,
    /// Identifier field of the affected row, when it has one.
    pub row_id: Option<String>,
    #[serde(flatten)]
    pub kind: SchemaIssueKind,
}

impl SchemaIssue {
    /// True when the repair discarded source text.
    pub fn is_lossy(&self) -> bool {
        matches!(self.kind, SchemaIssueKind::Truncated { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaReport {
    pub fn push(&mut self, issue: SchemaIssue) {
        self.issues.push(issue);
    }

    pub fn padded_count(&self) -> usize {
        self.count(|kind| matches!(kind, SchemaIssueKind::Padded { .. }))
    }

    pub fn truncated_count(&self) -> usize {
        self.count(|kind| matches!(kind, SchemaIssueKind::Truncated { .. }))
    }

    pub fn blank_rows_dropped(&self) -> usize {
        self.count(|kind| matches!(kind, SchemaIssueKind::BlankRowDropped))
    }

    pub fn header_changed(&self) -> bool {
        self.count(|kind| {
            matches!(
                kind,
                SchemaIssueKind::HeaderReplaced { .. } | SchemaIssueKind::HeaderResized { .. }
            )
        }) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn count(&self, predicate: impl Fn(&SchemaIssueKind) -> bool) -> usize {
        self.issues
            .iter()
            .filter(|issue| predicate(&issue.kind))
            .count()
    }
}

// === Deduplication ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemovalReason {
    /// Another row with the same key had a greater (or equal, later) tiebreak.
    Superseded {
        discarded_tiebreak: String,
        kept_tiebreak: String,
    },
    /// The key is on the caller's deny-list.
    Denylisted,
}

/// A removed row paired with the row that superseded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub key: String,
    pub removed: Record,
    /// Surviving row for the same key; `None` for deny-listed keys with no survivor.
    pub survivor: Option<Record>,
    pub reason: RemovalReason,
}

/// Tiebreak value that is not in the fixed-width registration format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakWarning {
    pub line: usize,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupReport {
    pub input_rows: usize,
    pub output_rows: usize,
    /// Keys that had more than one row.
    pub collided_keys: usize,
    pub removals: Vec<Removal>,
    /// Rows with a blank key; never grouped, always kept.
    pub blank_keys: usize,
    pub format_warnings: Vec<TiebreakWarning>,
    /// Keys still occurring more than once (deny-list-only mode).
    pub remaining_duplicates: Vec<String>,
}

impl DedupReport {
    pub fn removed_count(&self) -> usize {
        self.removals.len()
    }

    pub fn superseded_count(&self) -> usize {
        self.removals
            .iter()
            .filter(|removal| matches!(removal.reason, RemovalReason::Superseded { .. }))
            .count()
    }

    pub fn denylisted_count(&self) -> usize {
        self.removals.len() - self.superseded_count()
    }
}

// === Field normalization ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub line: usize,
    pub column: String,
    pub line_breaks_collapsed: bool,
    pub delimiter_substituted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub changes: Vec<FieldChange>,
}

impl NormalizationReport {
    pub fn changed_fields(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

// === Renumbering ===

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenumberReport {
    pub start_id: u64,
    /// Last identifier assigned; `None` for an empty dataset.
    pub end_id: Option<u64>,
    /// Rows whose identifier text changed.
    pub reassigned: usize,
}

// === Output ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminatorKind {
    Lf,
    Crlf,
    Cr,
}

impl TerminatorKind {
    pub fn matches(self, expected: LineTerminator) -> bool {
        matches!(
            (self, expected),
            (Self::Lf, LineTerminator::Lf) | (Self::Crlf, LineTerminator::Crlf)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnViolation {
    /// 1-based record number; the header is record 1.
    pub record: usize,
    pub found: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminatorViolation {
    pub byte_offset: usize,
    pub found: TerminatorKind,
}

/// Outcome of re-reading written output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub expected_columns: usize,
    pub expected_terminator: LineTerminator,
    /// Records parsed, header included.
    pub records_checked: usize,
    pub column_violations: Vec<ColumnViolation>,
    pub terminator_violations: Vec<TerminatorViolation>,
    pub bom_present: bool,
    /// Parser failure message; verification cannot pass when set.
    pub parse_error: Option<String>,
}

impl VerifyReport {
    pub fn new(expected_columns: usize, expected_terminator: LineTerminator) -> Self {
        Self {
            expected_columns,
            expected_terminator,
            records_checked: 0,
            column_violations: Vec::new(),
            terminator_violations: Vec::new(),
            bom_present: false,
            parse_error: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.column_violations.is_empty()
            && self.terminator_violations.is_empty()
            && !self.bom_present
            && self.parse_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub path: PathBuf,
    /// Data rows written, header excluded.
    pub rows_written: usize,
    pub bytes_written: usize,
    pub sha256: String,
    pub line_terminator: LineTerminator,
    pub quote_all: bool,
    /// Copy of the previous canonical file, when one was made.
    pub backup: Option<PathBuf>,
}

// === Pipeline ===

/// Reports of every in-memory stage, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub input_terminators: TerminatorCensus,
    pub schema: SchemaReport,
    pub dedup: DedupReport,
    pub normalization: NormalizationReport,
    pub renumber: RenumberReport,
}
