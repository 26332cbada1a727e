use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use seedplan_model::{
    DedupReport, PipelineReport, RemovalReason, SchemaIssueKind, SchemaReport, VerifyReport,
};

use crate::types::{CleanResult, WriteStatus};

pub fn print_clean_summary(result: &CleanResult) {
    println!("Input: {}", result.input.display());
    println!("Output: {}", result.output.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Count"), header_cell("Detail")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for row in stage_rows(&result.pipeline) {
        table.add_row(row);
    }
    table.add_row(vec![
        Cell::new("Rows")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.rows).add_attribute(Attribute::Bold),
        dim_cell("after reconciliation"),
    ]);
    println!("{table}");

    print_schema_issues(&result.pipeline.schema);
    print_removals(&result.pipeline.dedup);

    match &result.outcome {
        WriteStatus::DryRun => println!("Dry run: nothing written."),
        WriteStatus::Committed { write, .. } => {
            println!(
                "Wrote {} rows ({} bytes, {}) sha256 {}",
                write.rows_written,
                write.bytes_written,
                write.line_terminator.label(),
                write.sha256
            );
            if let Some(backup) = &write.backup {
                println!("Backup: {}", backup.display());
            }
        }
        WriteStatus::Rejected(verify) => {
            eprintln!("Output rejected; canonical file left unchanged.");
            print_verify_table(verify);
        }
    }
}

pub fn print_verify_summary(path: &Path, report: &VerifyReport) {
    println!("File: {}", path.display());
    print_verify_table(report);
    if report.passed() {
        println!("Verification passed.");
    } else {
        eprintln!("Verification failed.");
    }
}

fn stage_rows(report: &PipelineReport) -> Vec<Vec<Cell>> {
    let census = &report.input_terminators;
    let schema = &report.schema;
    let dedup = &report.dedup;
    let renumber = &report.renumber;
    vec![
        vec![
            Cell::new("Terminators"),
            Cell::new(census.total()),
            detail_cell(
                format!("CRLF {} / LF {} / CR {}", census.crlf, census.lf, census.cr),
                census.is_mixed(),
            ),
        ],
        vec![
            Cell::new("Padded"),
            count_cell(schema.padded_count(), Color::Yellow),
            dim_cell("short rows filled with empty fields"),
        ],
        vec![
            Cell::new("Truncated"),
            count_cell(schema.truncated_count(), Color::Red),
            dim_cell("long rows cut to schema width"),
        ],
        vec![
            Cell::new("Blank rows"),
            count_cell(schema.blank_rows_dropped(), Color::Yellow),
            dim_cell("dropped at ingest"),
        ],
        vec![
            Cell::new("Header"),
            dim_cell("-"),
            detail_cell(
                if schema.header_changed() { "replaced" } else { "unchanged" },
                schema.header_changed(),
            ),
        ],
        vec![
            Cell::new("Superseded"),
            count_cell(dedup.superseded_count(), Color::Yellow),
            dim_cell(format!("{} colliding keys", dedup.collided_keys)),
        ],
        vec![
            Cell::new("Deny-listed"),
            count_cell(dedup.denylisted_count(), Color::Yellow),
            remaining_cell(dedup),
        ],
        vec![
            Cell::new("Tiebreak format"),
            count_cell(dedup.format_warnings.len(), Color::Yellow),
            dim_cell("values outside YYYYMMDD-XXXX"),
        ],
        vec![
            Cell::new("Normalized"),
            count_cell(report.normalization.changed_fields(), Color::Yellow),
            dim_cell("fields rewritten"),
        ],
        vec![
            Cell::new("Renumbered"),
            count_cell(renumber.reassigned, Color::Yellow),
            dim_cell(match renumber.end_id {
                Some(end) => format!("ids {}..={}", renumber.start_id, end),
                None => "no rows".to_string(),
            }),
        ],
    ]
}

fn print_schema_issues(report: &SchemaReport) {
    if report.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Line"),
        header_cell("Row id"),
        header_cell("Issue"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in &report.issues {
        let (label, detail) = match &issue.kind {
            SchemaIssueKind::Padded { found, added } => (
                Cell::new("padded").fg(Color::Yellow),
                format!("{found} fields, {added} added"),
            ),
            SchemaIssueKind::Truncated {
                found,
                discarded_count,
                ..
            } => (
                Cell::new("truncated")
                    .fg(Color::Red)
                    .add_attribute(Attribute::Bold),
                format!("{found} fields, {discarded_count} discarded"),
            ),
            SchemaIssueKind::HeaderReplaced { found } => (
                Cell::new("header replaced").fg(Color::Yellow),
                format!("{} columns found", found.len()),
            ),
            SchemaIssueKind::HeaderResized { found, expected } => (
                Cell::new("header resized").fg(Color::Yellow),
                format!("{found} -> {expected} columns"),
            ),
            SchemaIssueKind::BlankRowDropped => {
                (Cell::new("blank row").fg(Color::DarkGrey), "-".to_string())
            }
        };
        table.add_row(vec![
            Cell::new(issue.line),
            optional_cell(issue.row_id.as_deref()),
            label,
            Cell::new(detail),
        ]);
    }
    println!();
    println!("Schema issues:");
    println!("{table}");
}

fn print_removals(report: &DedupReport) {
    if report.removals.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Removed line"),
        header_cell("Kept line"),
        header_cell("Reason"),
        header_cell("Discarded"),
        header_cell("Kept"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for removal in &report.removals {
        let kept_line = removal.survivor.as_ref().map(|row| row.line);
        let (reason, discarded, kept) = match &removal.reason {
            RemovalReason::Superseded {
                discarded_tiebreak,
                kept_tiebreak,
            } => (
                Cell::new("superseded").fg(Color::Yellow),
                Cell::new(discarded_tiebreak),
                Cell::new(kept_tiebreak).fg(Color::Green),
            ),
            RemovalReason::Denylisted => (
                Cell::new("deny-listed").fg(Color::Red),
                dim_cell("-"),
                dim_cell("-"),
            ),
        };
        table.add_row(vec![
            Cell::new(&removal.key)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(removal.removed.line),
            match kept_line {
                Some(line) => Cell::new(line),
                None => dim_cell("-"),
            },
            reason,
            discarded,
            kept,
        ]);
    }
    println!();
    println!("Dedup removals:");
    println!("{table}");
}

fn print_verify_table(report: &VerifyReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Check"), header_cell("Result")]);
    apply_summary_table_style(&mut table);
    table.add_row(vec![
        Cell::new("Records"),
        Cell::new(report.records_checked),
    ]);
    table.add_row(vec![
        Cell::new(format!("Columns = {}", report.expected_columns)),
        violation_cell(
            report.column_violations.len(),
            report
                .column_violations
                .iter()
                .take(5)
                .map(|v| format!("record {} has {}", v.record, v.found)),
        ),
    ]);
    table.add_row(vec![
        Cell::new(format!("Terminator {}", report.expected_terminator.label())),
        violation_cell(
            report.terminator_violations.len(),
            report
                .terminator_violations
                .iter()
                .take(5)
                .map(|v| format!("{:?} at byte {}", v.found, v.byte_offset)),
        ),
    ]);
    table.add_row(vec![
        Cell::new("No byte-order mark"),
        pass_cell(!report.bom_present),
    ]);
    if let Some(error) = &report.parse_error {
        table.add_row(vec![Cell::new("Parse"), Cell::new(error).fg(Color::Red)]);
    }
    println!("{table}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn detail_cell(value: impl ToString, highlight: bool) -> Cell {
    if highlight {
        Cell::new(value).fg(Color::Yellow)
    } else {
        dim_cell(value)
    }
}

fn remaining_cell(report: &DedupReport) -> Cell {
    if report.remaining_duplicates.is_empty() {
        dim_cell("no duplicates remain")
    } else {
        Cell::new(format!(
            "still duplicated: {}",
            report.remaining_duplicates.join(", ")
        ))
        .fg(Color::Red)
    }
}

fn violation_cell(count: usize, samples: impl Iterator<Item = String>) -> Cell {
    if count == 0 {
        return pass_cell(true);
    }
    let samples: Vec<String> = samples.collect();
    Cell::new(format!("{count} violations: {}", samples.join("; ")))
        .fg(Color::Red)
        .add_attribute(Attribute::Bold)
}

fn pass_cell(passed: bool) -> Cell {
    if passed {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
