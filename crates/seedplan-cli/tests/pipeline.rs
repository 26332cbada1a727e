//! Integration tests for the reconciliation pipeline.

use std::path::Path;

use seedplan_cli::pipeline::{PipelineOutput, run_pipeline};
use seedplan_ingest::{RawTable, parse_table};
use seedplan_model::{
    ColumnRef, DedupMode, LineTerminator, PipelineConfig, RemovalReason, SchemaIssueKind,
};
use seedplan_output::{WriteOptions, WriteOutcome, serialize_dataset, verify_bytes, write_dataset};

const MESSY: &str = "id,registrationId,疾患名,専門\r\n\
                     10,20250101-0001,肺がん,呼吸器\r\n\
                     20,20250102-0002,大腸がん\n\
                     10,20250301-0003,\"肺がん\r\n\r\n胃がん\",呼吸器,extra\n\
                     ,,,\n\
                     30,20250103-0004,\"乳がん,卵巣がん\",婦人科\n";

fn table(text: &str) -> RawTable {
    parse_table(text.as_bytes(), Path::new("seed_planning_data.csv")).unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig::new()
        .with_expected_columns(4)
        .with_key_column("id")
        .with_tiebreak_column("registrationId")
        .with_delimiter_sensitive("疾患名")
}

fn clean_bytes(text: &str, config: &PipelineConfig) -> (Vec<u8>, PipelineOutput) {
    let output = run_pipeline(table(text), config).unwrap();
    let bytes = serialize_dataset(&output.dataset, &WriteOptions::from_config(config)).unwrap();
    (bytes, output)
}

#[test]
fn test_latest_registration_survives() {
    let input = "id,registrationId,name\n\
                 374,20250101-0001,first\n\
                 374,20250315-0002,second\n";
    let config = PipelineConfig::new()
        .with_expected_columns(3)
        .with_key_column(0)
        .with_tiebreak_column(1);
    let output = run_pipeline(table(input), &config).unwrap();

    assert_eq!(output.dataset.len(), 1);
    assert_eq!(output.dataset.records[0].field(1), "20250315-0002");
    assert_eq!(output.dataset.records[0].field(2), "second");

    let dedup = &output.report.dedup;
    assert_eq!(dedup.removals.len(), 1);
    let removal = &dedup.removals[0];
    assert_eq!(removal.key, "374");
    assert_eq!(removal.removed.field(1), "20250101-0001");
    let survivor = removal.survivor.as_ref().unwrap();
    assert_eq!(survivor.field(0), "374");
    assert_eq!(survivor.field(1), "20250315-0002");
    assert_eq!(
        removal.reason,
        RemovalReason::Superseded {
            discarded_tiebreak: "20250101-0001".to_string(),
            kept_tiebreak: "20250315-0002".to_string(),
        }
    );
}

#[test]
fn test_embedded_delimiter_substituted() {
    let input = "id,list,note\n5,\"a,b\",c\n";
    let config = PipelineConfig::new()
        .with_expected_columns(3)
        .with_key_column(0)
        .with_tiebreak_column(2)
        .with_delimiter_sensitive(1);
    let (bytes, output) = clean_bytes(input, &config);
    assert_eq!(output.dataset.records[0].field(1), "a，b");

    let reparsed = parse_table(&bytes, Path::new("out.csv")).unwrap();
    assert_eq!(reparsed.rows.len(), 1);
    assert_eq!(reparsed.rows[0].fields, vec!["1", "a，b", "c"]);
    assert!(verify_bytes(&bytes, 3, LineTerminator::Lf).passed());
}

#[test]
fn test_messy_snapshot_cleaned() {
    let (bytes, output) = clean_bytes(MESSY, &config());
    let text = String::from_utf8(bytes).unwrap();
    insta::assert_snapshot!(text.trim_end(), @r#"
"id","registrationId","疾患名","専門"
"1","20250301-0003","肺がん；胃がん","呼吸器"
"2","20250102-0002","大腸がん",""
"3","20250103-0004","乳がん，卵巣がん","婦人科"
"#);

    let report = &output.report;
    assert!(report.input_terminators.is_mixed());
    assert_eq!(report.schema.padded_count(), 1);
    assert_eq!(report.schema.truncated_count(), 1);
    assert_eq!(report.schema.blank_rows_dropped(), 1);
    assert!(!report.schema.header_changed());
    let truncated = report
        .schema
        .issues
        .iter()
        .find(|issue| issue.is_lossy())
        .unwrap();
    assert_eq!(truncated.row_id.as_deref(), Some("10"));
    assert!(matches!(
        &truncated.kind,
        SchemaIssueKind::Truncated { discarded_count: 1, discarded, .. } if discarded == &["extra"]
    ));

    assert_eq!(report.dedup.superseded_count(), 1);
    assert_eq!(report.dedup.collided_keys, 1);
    assert!(report.dedup.format_warnings.is_empty());
    assert_eq!(report.normalization.changed_fields(), 2);
    assert_eq!(report.renumber.reassigned, 3);
    assert_eq!(report.renumber.end_id, Some(3));
}

#[test]
fn test_pipeline_is_idempotent() {
    let config = config();
    let (first, _) = clean_bytes(MESSY, &config);
    let rerun_input = String::from_utf8(first.clone()).unwrap();
    let (second, output) = clean_bytes(&rerun_input, &config);

    assert_eq!(first, second);
    let report = &output.report;
    assert!(report.schema.is_empty());
    assert!(report.dedup.removals.is_empty());
    assert!(report.normalization.is_empty());
    assert_eq!(report.renumber.reassigned, 0);
}

#[test]
fn test_canonical_header_replaces_input_header() {
    let input = "ID,regId\n1,20250101-0001\n";
    let config = PipelineConfig::new()
        .with_canonical_header(["id", "registrationId", "疾患名"])
        .with_key_column("id")
        .with_tiebreak_column("registrationId");
    let output = run_pipeline(table(input), &config).unwrap();
    assert_eq!(output.dataset.header(), ["id", "registrationId", "疾患名"]);
    assert!(output.report.schema.header_changed());
    assert_eq!(output.report.schema.padded_count(), 1);
    assert_eq!(output.dataset.records[0].fields, vec!["1", "20250101-0001", ""]);
}

#[test]
fn test_denylist_mode_reports_remaining_duplicates() {
    let input = "id,caseKey,registrationId\n\
                 1,K207,20250101-0001\n\
                 2,K208,20250101-0002\n\
                 3,K356,20250101-0003\n\
                 4,K5,20250101-0004\n\
                 5,K5,20250101-0005\n";
    let config = PipelineConfig::new()
        .with_expected_columns(3)
        .with_key_column("caseKey")
        .with_id_column("id")
        .with_dedup_mode(DedupMode::Denylist)
        .with_denylist(["K208", "K356"]);
    let output = run_pipeline(table(input), &config).unwrap();
    let dedup = &output.report.dedup;
    assert_eq!(dedup.denylisted_count(), 2);
    assert_eq!(dedup.superseded_count(), 0);
    assert_eq!(dedup.remaining_duplicates, vec!["K5".to_string()]);
    assert_eq!(output.dataset.len(), 3);
    // renumbering still yields unique ids
    let ids: Vec<&str> = output.dataset.records.iter().map(|r| r.field(0)).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_denylist_rerun_is_idempotent() {
    let input = "id,caseKey,registrationId\n\
                 1,K1,20250101-0001\n\
                 9,K9,20250101-0002\n\
                 2,K2,20250101-0003\n\
                 3,K3,20250101-0004\n\
                 3,K3,20250201-0004\n";
    let config = PipelineConfig::new()
        .with_expected_columns(3)
        .with_key_column("caseKey")
        .with_tiebreak_column("registrationId")
        .with_id_column("id")
        .with_dedup_mode(DedupMode::DenylistThenLatest)
        .with_denylist(["K9", "K2"]);
    let (first, output) = clean_bytes(input, &config);
    assert_eq!(output.report.dedup.denylisted_count(), 2);
    assert_eq!(output.report.dedup.superseded_count(), 1);
    let rows: Vec<(&str, &str)> = output
        .dataset
        .records
        .iter()
        .map(|r| (r.field(0), r.field(1)))
        .collect();
    assert_eq!(rows, vec![("1", "K1"), ("2", "K3")]);

    let rerun_input = String::from_utf8(first.clone()).unwrap();
    let (second, rerun) = clean_bytes(&rerun_input, &config);
    assert_eq!(first, second);
    assert!(rerun.report.dedup.removals.is_empty());
    assert_eq!(rerun.report.renumber.reassigned, 0);
}

#[test]
fn test_denylist_on_renumbered_key_is_structural() {
    let input = "id,registrationId\n1,20250101-0001\n9,20250101-0002\n2,20250101-0003\n3,20250101-0004\n";
    let config = PipelineConfig::new()
        .with_expected_columns(2)
        .with_key_column(0)
        .with_tiebreak_column(1)
        .with_dedup_mode(DedupMode::DenylistThenLatest)
        .with_denylist(["9", "2"]);
    let error = run_pipeline(table(input), &config).unwrap_err();
    assert!(format!("{error:#}").contains("renumbering rewrites"));
}

#[test]
fn test_start_id_overflow_is_structural() {
    let overflowing = config().with_start_id(u64::MAX);
    let error = run_pipeline(table(MESSY), &overflowing).unwrap_err();
    assert!(format!("{error:#}").contains("leaves no room"));

    // the last representable id is still usable
    let at_limit = config().with_start_id(u64::MAX - 2);
    let output = run_pipeline(table(MESSY), &at_limit).unwrap();
    assert_eq!(output.report.renumber.end_id, Some(u64::MAX));
}

#[test]
fn test_missing_key_column_is_structural() {
    let config = PipelineConfig::new().with_expected_columns(4);
    let error = run_pipeline(table(MESSY), &config).unwrap_err();
    assert!(format!("{error:#}").contains("key_column"));
}

#[test]
fn test_unknown_column_name_is_structural() {
    let config = config().with_tiebreak_column("registeredAt");
    assert!(run_pipeline(table(MESSY), &config).is_err());
}

#[test]
fn test_crlf_write_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed_planning_data.csv");
    std::fs::write(&path, MESSY).unwrap();

    let config = config()
        .with_line_terminator(LineTerminator::Crlf)
        .with_start_id(100);
    let output = run_pipeline(table(MESSY), &config).unwrap();
    let outcome = write_dataset(&output.dataset, &path, &WriteOptions::from_config(&config)).unwrap();
    let WriteOutcome::Committed { write, verify } = outcome else {
        panic!("clean output should verify");
    };
    assert!(verify.passed());
    assert_eq!(verify.records_checked, 4);
    assert_eq!(write.rows_written, 3);

    let written = std::fs::read(&path).unwrap();
    let bare_lf = written
        .iter()
        .enumerate()
        .filter(|(idx, byte)| **byte == b'\n' && (*idx == 0 || written[idx - 1] != b'\r'))
        .count();
    assert_eq!(bare_lf, 0);
    let reparsed = parse_table(&written, &path).unwrap();
    let ids: Vec<&str> = reparsed.rows.iter().map(|r| r.field(0)).collect();
    assert_eq!(ids, vec!["100", "101", "102"]);
}

#[test]
fn test_exempt_line_break_rejected_under_crlf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed_planning_data.csv");
    std::fs::write(&path, "previous").unwrap();

    let input = "id,registrationId,note\n1,20250101-0001,\"a\nb\"\n";
    let mut config = PipelineConfig::new()
        .with_expected_columns(3)
        .with_key_column("id")
        .with_tiebreak_column("registrationId")
        .with_line_terminator(LineTerminator::Crlf);
    config.exempt_columns = vec![ColumnRef::Name("note".to_string())];
    let output = run_pipeline(table(input), &config).unwrap();
    assert!(output.report.normalization.is_empty());
    assert_eq!(output.dataset.records[0].field(2), "a\nb");

    let outcome = write_dataset(&output.dataset, &path, &WriteOptions::from_config(&config)).unwrap();
    let WriteOutcome::Rejected { verify } = outcome else {
        panic!("bare LF in an exempt field must fail CRLF verification");
    };
    assert_eq!(verify.terminator_violations.len(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
}
