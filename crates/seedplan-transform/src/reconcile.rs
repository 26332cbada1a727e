//! Schema width reconciliation.
//!
//! Short rows are padded on the right (a trailing-empty-field artifact of the
//! source serialization, so nothing is lost). Long rows keep their first
//! `expected` fields and the discarded tail is reported. Nothing here fails:
//! every row comes out at the schema width.

use seedplan_model::{Record, Result, Schema, SchemaIssue, SchemaIssueKind};
use tracing::warn;

/// Line of the header record in every supported input.
const HEADER_LINE: usize = 1;

/// Bring one row to `expected` fields.
///
/// `id_column` selects the field quoted in the issue so the row can be found
/// again; it is read before truncation.
pub fn reconcile_row(
    mut record: Record,
    expected: usize,
    id_column: Option<usize>,
) -> (Record, Option<SchemaIssue>) {
    let found = record.len();
    if found == expected {
        return (record, None);
    }
    let row_id = id_column
        .map(|idx| record.field(idx).trim().to_string())
        .filter(|value| !value.is_empty());
    let kind = if found < expected {
        record.fields.resize(expected, String::new());
        SchemaIssueKind::Padded {
            found,
            added: expected - found,
        }
    } else {
        let discarded = record.fields.split_off(expected);
        warn!(
            line = record.line,
            found,
            expected,
            discarded = discarded.len(),
            "row truncated to schema width"
        );
        SchemaIssueKind::Truncated {
            found,
            discarded_count: discarded.len(),
            discarded,
        }
    };
    let issue = SchemaIssue {
        line: record.line,
        row_id,
        kind,
    };
    (record, Some(issue))
}

/// Reconcile every row, collecting issues in row order.
pub fn reconcile_rows(
    records: Vec<Record>,
    expected: usize,
    id_column: Option<usize>,
) -> (Vec<Record>, Vec<SchemaIssue>) {
    let mut rows = Vec::with_capacity(records.len());
    let mut issues = Vec::new();
    for record in records {
        let (row, issue) = reconcile_row(record, expected, id_column);
        rows.push(row);
        issues.extend(issue);
    }
    (rows, issues)
}

/// Settle the header.
///
/// With a canonical header, any difference in length or (trimmed) content
/// replaces the input header. Without one, the input header is padded or
/// truncated to `expected` like a data row.
pub fn reconcile_header(
    found: &[String],
    canonical: Option<&Schema>,
    expected: usize,
) -> Result<(Schema, Option<SchemaIssue>)> {
    if let Some(canonical) = canonical {
        let matches = found.len() == canonical.width()
            && found
                .iter()
                .zip(canonical.columns())
                .all(|(left, right)| left.trim() == right.trim());
        if matches {
            return Ok((canonical.clone(), None));
        }
        warn!(
            found = found.len(),
            expected = canonical.width(),
            "header replaced with canonical header"
        );
        let issue = SchemaIssue {
            line: HEADER_LINE,
            row_id: None,
            kind: SchemaIssueKind::HeaderReplaced {
                found: found.to_vec(),
            },
        };
        return Ok((canonical.clone(), Some(issue)));
    }

    if found.len() == expected {
        return Ok((Schema::new(found.to_vec())?, None));
    }
    let mut columns = found.to_vec();
    columns.resize(expected, String::new());
    warn!(
        found = found.len(),
        expected, "header resized to schema width"
    );
    let issue = SchemaIssue {
        line: HEADER_LINE,
        row_id: None,
        kind: SchemaIssueKind::HeaderResized {
            found: found.len(),
            expected,
        },
    };
    Ok((Schema::new(columns)?, Some(issue)))
}

/// Issues for rows dropped at ingest because every field was blank.
pub fn blank_row_issues(lines: &[usize]) -> Vec<SchemaIssue> {
    lines
        .iter()
        .map(|&line| SchemaIssue {
            line,
            row_id: None,
            kind: SchemaIssueKind::BlankRowDropped,
        })
        .collect()
}
