//! Reconciliation pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Reconcile**: settle the header, bring every row to the schema width
//! 2. **Dedupe**: one row per key under the configured policy
//! 3. **Normalize**: collapse embedded line breaks, substitute delimiters
//! 4. **Renumber**: dense sequential identifiers in row order
//!
//! Writing and verification happen afterwards, in the `clean` command. Each
//! stage returns its own report; nothing is accumulated in shared state.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, trace, warn};

use seedplan_ingest::RawTable;
use seedplan_model::{
    Dataset, LineTerminator, PipelineConfig, PipelineReport, ResolvedColumns, SchemaIssueKind,
    SchemaReport,
};
use seedplan_transform::{
    FieldNormalizer, blank_row_issues, dedupe_dataset, normalize_dataset, reconcile_header,
    reconcile_rows, renumber,
};

use crate::logging::redact_value;

/// Reconciled dataset plus the reports of every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub dataset: Dataset,
    pub columns: ResolvedColumns,
    pub report: PipelineReport,
}

/// Run every in-memory stage over a parsed snapshot.
///
/// Only structural problems (missing or conflicting configuration, column
/// references that do not resolve) are errors; row-level anomalies end up in
/// the returned report.
pub fn run_pipeline(table: RawTable, config: &PipelineConfig) -> Result<PipelineOutput> {
    let expected = config.schema_width().context("determine schema width")?;
    let canonical = config
        .canonical_schema()
        .context("load canonical header")?;

    // =========================================================================
    // Stage 1: Reconcile
    // =========================================================================
    let (dataset, columns, schema_report) =
        info_span!("reconcile", expected_columns = expected).in_scope(|| -> Result<_> {
            let start = Instant::now();
            let (schema, header_issue) =
                reconcile_header(&table.header, canonical.as_ref(), expected)
                    .context("reconcile header")?;
            let columns = config
                .resolve(&schema)
                .context("resolve configured columns")?;
            if config.line_terminator == LineTerminator::Crlf && !columns.exempt.is_empty() {
                warn!(
                    exempt = ?columns.exempt,
                    "exempt columns keep raw line breaks; a bare LF in one will fail CRLF verification"
                );
            }
            let input_rows = table.rows.len();
            let (rows, row_issues) = reconcile_rows(table.rows, expected, Some(columns.id));

            let mut issues: Vec<_> = row_issues
                .into_iter()
                .chain(blank_row_issues(&table.blank_lines))
                .collect();
            issues.sort_by_key(|issue| issue.line);
            let mut report = SchemaReport::default();
            report.issues.extend(header_issue);
            report.issues.extend(issues);

            for issue in &report.issues {
                if let SchemaIssueKind::Truncated { discarded, .. } = &issue.kind {
                    for value in discarded {
                        trace!(line = issue.line, value = redact_value(value), "discarded field");
                    }
                }
            }
            info!(
                input_rows,
                padded = report.padded_count(),
                truncated = report.truncated_count(),
                blank_rows_dropped = report.blank_rows_dropped(),
                header_changed = report.header_changed(),
                duration_ms = start.elapsed().as_millis(),
                "reconcile complete"
            );
            Ok((Dataset::new(schema, rows), columns, report))
        })?;
    let mut dataset = dataset;

    // =========================================================================
    // Stage 2: Dedupe
    // =========================================================================
    let dedup = info_span!("dedupe", mode = ?config.dedup_mode).in_scope(|| {
        let start = Instant::now();
        let report = dedupe_dataset(
            &mut dataset,
            &columns,
            config.dedup_mode,
            &config.denylist_keys,
            config.tiebreak_format,
        );
        info!(
            removed = report.removed_count(),
            duration_ms = start.elapsed().as_millis(),
            "dedupe complete"
        );
        report
    });

    // =========================================================================
    // Stage 3: Normalize
    // =========================================================================
    let normalization = info_span!("normalize").in_scope(|| {
        let start = Instant::now();
        let normalizer = FieldNormalizer::from_config(config);
        let report = normalize_dataset(&mut dataset, &columns, &normalizer);
        info!(
            changed_fields = report.changed_fields(),
            duration_ms = start.elapsed().as_millis(),
            "normalize complete"
        );
        report
    });

    // =========================================================================
    // Stage 4: Renumber
    // =========================================================================
    let renumbered =
        info_span!("renumber", start_id = config.start_id).in_scope(|| -> Result<_> {
            let start = Instant::now();
            let report = renumber(&mut dataset.records, columns.id, config.start_id)
                .context("renumber identifiers")?;
            info!(
                reassigned = report.reassigned,
                end_id = ?report.end_id,
                duration_ms = start.elapsed().as_millis(),
                "renumber complete"
            );
            Ok(report)
        })?;

    let report = PipelineReport {
        input_terminators: table.terminators,
        schema: schema_report,
        dedup,
        normalization,
        renumber: renumbered,
    };
    Ok(PipelineOutput {
        dataset,
        columns,
        report,
    })
}
