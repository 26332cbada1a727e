//! Configuration options for a reconciliation run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::{ColumnRef, ResolvedColumns, Schema};

/// Field delimiter of the persisted format.
pub const DELIMITER: char = ',';

/// Quote character of the persisted format.
pub const QUOTE: char = '"';

/// Default marker replacing embedded line breaks (full-width semicolon).
pub const DEFAULT_LINE_BREAK_MARKER: char = '\u{ff1b}';

/// Default substitute for delimiters in multi-value fields (full-width comma).
pub const DEFAULT_DELIMITER_SUBSTITUTE: char = '\u{ff0c}';

/// Policy used to resolve rows sharing a dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Keep the row with the greatest tiebreak value per key.
    #[default]
    Latest,
    /// Remove rows whose key is on the deny-list; nothing else.
    Denylist,
    /// Apply the deny-list, then resolve remaining collisions by tiebreak.
    DenylistThenLatest,
}

impl DedupMode {
    pub fn uses_denylist(self) -> bool {
        matches!(self, Self::Denylist | Self::DenylistThenLatest)
    }

    pub fn uses_tiebreak(self) -> bool {
        matches!(self, Self::Latest | Self::DenylistThenLatest)
    }
}

/// Line terminator written between records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Lf,
    Crlf,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lf => "LF",
            Self::Crlf => "CRLF",
        }
    }
}

/// Expected shape of tiebreak values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakFormat {
    /// `YYYYMMDD-XXXX`; non-matching values are reported.
    #[default]
    Registration,
    /// Any text; compared lexically without auditing.
    Any,
}

/// Options controlling one pipeline run.
///
/// Deserializes from a config file with every field optional; missing fields
/// take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Required schema width. May be omitted when `canonical_header` is set.
    pub expected_columns: Option<usize>,
    /// Header that replaces any non-matching input header.
    pub canonical_header: Option<Vec<String>>,
    /// Dedup key column.
    pub key_column: Option<ColumnRef>,
    /// Column whose greatest value wins a dedup collision.
    pub tiebreak_column: Option<ColumnRef>,
    /// Column renumbered after dedup. Defaults to the key column.
    pub id_column: Option<ColumnRef>,
    pub dedup_mode: DedupMode,
    /// Keys removed unconditionally in deny-list modes.
    ///
    /// Matched against the key column before renumbering, so the key column
    /// must differ from the id column whenever this list is non-empty.
    pub denylist_keys: BTreeSet<String>,
    pub tiebreak_format: TiebreakFormat,
    /// Multi-value columns whose delimiter characters are substituted.
    pub delimiter_sensitive_columns: Vec<ColumnRef>,
    /// Columns left untouched by the field normalizer.
    ///
    /// Line breaks in these columns are written as-is, so with
    /// `line_terminator = "crlf"` a bare LF in an exempt field fails
    /// verification and the write is rejected.
    pub exempt_columns: Vec<ColumnRef>,
    pub line_break_marker: char,
    pub delimiter_substitute: char,
    pub line_terminator: LineTerminator,
    pub quote_all: bool,
    pub start_id: u64,
    /// Copy the existing canonical file aside before replacing it.
    pub backup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            expected_columns: None,
            canonical_header: None,
            key_column: None,
            tiebreak_column: None,
            id_column: None,
            dedup_mode: DedupMode::default(),
            denylist_keys: BTreeSet::new(),
            tiebreak_format: TiebreakFormat::default(),
            delimiter_sensitive_columns: Vec::new(),
            exempt_columns: Vec::new(),
            line_break_marker: DEFAULT_LINE_BREAK_MARKER,
            delimiter_substitute: DEFAULT_DELIMITER_SUBSTITUTE,
            line_terminator: LineTerminator::default(),
            quote_all: true,
            start_id: 1,
            backup: false,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expected_columns(mut self, columns: usize) -> Self {
        self.expected_columns = Some(columns);
        self
    }

    pub fn with_canonical_header<I, S>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.canonical_header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_key_column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    pub fn with_tiebreak_column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.tiebreak_column = Some(column.into());
        self
    }

    pub fn with_id_column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn with_dedup_mode(mut self, mode: DedupMode) -> Self {
        self.dedup_mode = mode;
        self
    }

    pub fn with_denylist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter_sensitive(mut self, column: impl Into<ColumnRef>) -> Self {
        self.delimiter_sensitive_columns.push(column.into());
        self
    }

    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    pub fn with_start_id(mut self, start_id: u64) -> Self {
        self.start_id = start_id;
        self
    }

    /// Last identifier renumbering assigns to `rows` rows, or `None` when
    /// there are no rows.
    pub fn end_id(&self, rows: usize) -> Result<Option<u64>> {
        id_range_end(self.start_id, rows)
    }

    /// Schema width implied by `expected_columns` and `canonical_header`.
    pub fn schema_width(&self) -> Result<usize> {
        let width = match (self.expected_columns, &self.canonical_header) {
            (Some(expected), Some(header)) if expected != header.len() => {
                return Err(ModelError::WidthConflict {
                    expected,
                    header: header.len(),
                });
            }
            (Some(expected), _) => expected,
            (None, Some(header)) => header.len(),
            (None, None) => {
                return Err(ModelError::MissingOption {
                    option: "expected_columns",
                });
            }
        };
        if width == 0 {
            return Err(ModelError::EmptySchema);
        }
        Ok(width)
    }

    /// The configured canonical header as a schema, if any.
    pub fn canonical_schema(&self) -> Result<Option<Schema>> {
        self.schema_width()?;
        self.canonical_header
            .clone()
            .map(Schema::new)
            .transpose()
    }

    /// Resolve every column reference against `schema`.
    ///
    /// Fails when a required reference is missing or does not name a column,
    /// or when a non-empty deny-list targets the column renumbering rewrites.
    pub fn resolve(&self, schema: &Schema) -> Result<ResolvedColumns> {
        self.check_markers()?;
        let key_ref = self.key_column.as_ref().ok_or(ModelError::MissingOption {
            option: "key_column",
        })?;
        let key = schema.resolve(key_ref)?;
        let tiebreak = match &self.tiebreak_column {
            Some(column) => Some(schema.resolve(column)?),
            None if self.dedup_mode.uses_tiebreak() => {
                return Err(ModelError::MissingOption {
                    option: "tiebreak_column",
                });
            }
            None => None,
        };
        let id = match &self.id_column {
            Some(column) => schema.resolve(column)?,
            None => key,
        };
        // a rerun would match the deny-list against freshly assigned ids
        if self.dedup_mode.uses_denylist() && !self.denylist_keys.is_empty() && key == id {
            return Err(ModelError::DenylistOnRenumberedColumn { column: key });
        }
        Ok(ResolvedColumns {
            key,
            tiebreak,
            id,
            delimiter_sensitive: schema.resolve_all(&self.delimiter_sensitive_columns)?,
            exempt: schema.resolve_all(&self.exempt_columns)?,
        })
    }

    fn check_markers(&self) -> Result<()> {
        let reserved = |ch: char| matches!(ch, DELIMITER | QUOTE | '\r' | '\n');
        if reserved(self.line_break_marker) {
            return Err(ModelError::InvalidMarker {
                option: "line_break_marker",
                value: self.line_break_marker,
            });
        }
        if reserved(self.delimiter_substitute) {
            return Err(ModelError::InvalidMarker {
                option: "delimiter_substitute",
                value: self.delimiter_substitute,
            });
        }
        Ok(())
    }
}

/// Last identifier of a dense run of `rows` ids starting at `start_id`.
pub fn id_range_end(start_id: u64, rows: usize) -> Result<Option<u64>> {
    let Some(last_offset) = rows.checked_sub(1) else {
        return Ok(None);
    };
    u64::try_from(last_offset)
        .ok()
        .and_then(|offset| start_id.checked_add(offset))
        .map(Some)
        .ok_or(ModelError::IdRangeOverflow { start_id, rows })
}
