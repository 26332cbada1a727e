//! Field text normalization.
//!
//! Quoting in the writer is what keeps the format intact; this pass exists for
//! consumers that split on delimiters or line breaks without honoring quotes.
//! Both rewrites are idempotent: their output never contains the characters
//! that trigger them.

use std::borrow::Cow;

use seedplan_model::{
    DEFAULT_DELIMITER_SUBSTITUTE, DEFAULT_LINE_BREAK_MARKER, DELIMITER, Dataset, FieldChange,
    NormalizationReport, PipelineConfig, ResolvedColumns,
};
use tracing::debug;

/// Rewrites a single field so it survives naive delimiter and line splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNormalizer {
    marker: char,
    delimiter: char,
    substitute: char,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_BREAK_MARKER, DEFAULT_DELIMITER_SUBSTITUTE)
    }
}

impl FieldNormalizer {
    pub fn new(marker: char, substitute: char) -> Self {
        Self {
            marker,
            delimiter: DELIMITER,
            substitute,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.line_break_marker, config.delimiter_substitute)
    }

    /// Collapse CR, LF and CRLF into the marker.
    ///
    /// In a field that had line breaks, runs of the marker shrink to one and
    /// the marker is stripped from both ends. Fields without line breaks are
    /// returned borrowed and unchanged.
    pub fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if !has_line_break(value) {
            return Cow::Borrowed(value);
        }
        Cow::Owned(self.collapse(value))
    }

    /// Like [`normalize`](Self::normalize), then replace delimiters with the
    /// substitute.
    ///
    /// A field holding a delimiter gets the full marker cleanup even without
    /// line breaks, so `；a；；b,c` becomes `a；b，c`.
    pub fn normalize_delimited<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if !value.contains(self.delimiter) {
            return self.normalize(value);
        }
        let mut buf = [0u8; 4];
        let substitute: &str = self.substitute.encode_utf8(&mut buf);
        Cow::Owned(self.collapse(value).replace(self.delimiter, substitute))
    }

    fn collapse(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    self.push_marker(&mut out);
                }
                '\n' => self.push_marker(&mut out),
                c if c == self.marker => self.push_marker(&mut out),
                c => out.push(c),
            }
        }
        let trimmed = out.trim_matches(self.marker);
        if trimmed.len() == out.len() {
            out
        } else {
            trimmed.to_string()
        }
    }

    fn push_marker(&self, out: &mut String) {
        if !out.ends_with(self.marker) {
            out.push(self.marker);
        }
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Normalize every non-exempt field of every row in place.
pub fn normalize_dataset(
    dataset: &mut Dataset,
    columns: &ResolvedColumns,
    normalizer: &FieldNormalizer,
) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    let schema = &dataset.schema;
    for record in &mut dataset.records {
        let line = record.line;
        for (idx, field) in record.fields.iter_mut().enumerate() {
            if columns.exempt.contains(&idx) {
                continue;
            }
            let sensitive = columns.delimiter_sensitive.contains(&idx);
            let normalized = if sensitive {
                normalizer.normalize_delimited(field)
            } else {
                normalizer.normalize(field)
            };
            let Cow::Owned(updated) = normalized else {
                continue;
            };
            if updated == *field {
                continue;
            }
            let change = FieldChange {
                line,
                column: schema.label(idx),
                line_breaks_collapsed: has_line_break(field),
                delimiter_substituted: sensitive && field.contains(normalizer.delimiter),
            };
            debug!(
                line,
                column = %change.column,
                line_breaks = change.line_breaks_collapsed,
                delimiter = change.delimiter_substituted,
                "field normalized"
            );
            report.changes.push(change);
            *field = updated;
        }
    }
    report
}
