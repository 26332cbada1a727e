use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use seedplan_cli::config::load_config;
use seedplan_cli::pipeline::{PipelineOutput, run_pipeline};
use seedplan_ingest::read_table;
use seedplan_model::{PipelineConfig, VerifyReport};
use seedplan_output::{WriteOptions, WriteOutcome, verify_file, write_dataset};

use crate::cli::{CleanArgs, VerifyArgs};
use crate::types::{CleanResult, RunReport, WriteStatus};

pub fn run_clean(args: &CleanArgs) -> Result<CleanResult> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let config = args.overrides().apply(config);
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    let clean_span = info_span!("clean", input = %args.input.display());
    let _clean_guard = clean_span.enter();

    let ingest_start = Instant::now();
    let table = info_span!("ingest")
        .in_scope(|| read_table(&args.input))
        .with_context(|| format!("read {}", args.input.display()))?;
    info!(
        rows = table.rows.len(),
        blank_rows = table.blank_lines.len(),
        mixed_terminators = table.terminators.is_mixed(),
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );

    let PipelineOutput {
        dataset, report, ..
    } = run_pipeline(table, &config)?;

    let outcome = if args.dry_run {
        info!("dry run; nothing written");
        WriteStatus::DryRun
    } else {
        let output_start = Instant::now();
        let options = WriteOptions::from_config(&config);
        let outcome = info_span!("output", path = %output.display())
            .in_scope(|| write_dataset(&dataset, &output, &options))
            .with_context(|| format!("write {}", output.display()))?;
        info!(
            committed = outcome.is_committed(),
            duration_ms = output_start.elapsed().as_millis(),
            "output complete"
        );
        match outcome {
            WriteOutcome::Committed { write, verify } => WriteStatus::Committed { write, verify },
            WriteOutcome::Rejected { verify } => {
                warn!(path = %output.display(), "new content rejected by verification");
                WriteStatus::Rejected(verify)
            }
        }
    };

    let result = CleanResult {
        input: args.input.clone(),
        output,
        rows: dataset.len(),
        pipeline: report,
        outcome,
    };
    if let Some(path) = &args.report {
        write_run_report(&result, path)?;
    }
    Ok(result)
}

pub fn run_verify(args: &VerifyArgs) -> Result<VerifyReport> {
    verify_file(
        &args.file,
        args.expected_columns,
        args.line_terminator.into(),
    )
    .with_context(|| format!("verify {}", args.file.display()))
}

fn write_run_report(result: &CleanResult, path: &Path) -> Result<()> {
    let report = RunReport {
        input: &result.input,
        output: &result.output,
        pipeline: &result.pipeline,
        write: &result.outcome,
    };
    let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}
