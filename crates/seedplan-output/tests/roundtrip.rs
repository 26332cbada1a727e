//! Serialization round trips through the ingest parser.

use std::fs;
use std::path::Path;

use seedplan_model::{Dataset, LineTerminator, Record, Schema};
use seedplan_output::{WriteOptions, WriteOutcome, serialize_dataset, verify_file, write_dataset};

fn schema() -> Schema {
    Schema::new(vec![
        "id".to_string(),
        "registrationId".to_string(),
        "疾患名".to_string(),
    ])
    .unwrap()
}

fn dataset(rows: Vec<Vec<&str>>) -> Dataset {
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(idx, fields)| Record::new(idx + 2, fields.into_iter().map(String::from).collect()))
        .collect();
    Dataset::new(schema(), records)
}

#[test]
fn test_special_characters_survive_reparse() {
    let data = dataset(vec![
        vec!["1", "20250101-0001", "a,b"],
        vec!["2", "20250102-0002", "say \"hi\""],
        vec!["3", "20250103-0003", "肺がん，胃がん"],
        vec!["4", "20250104-0004", ""],
    ]);
    for options in [
        WriteOptions::default(),
        WriteOptions {
            quote_all: false,
            ..WriteOptions::default()
        },
    ] {
        let bytes = serialize_dataset(&data, &options).unwrap();
        let table = seedplan_ingest::parse_table(&bytes, Path::new("roundtrip.csv")).unwrap();
        assert_eq!(table.header, data.header());
        let reparsed: Vec<&Vec<String>> = table.rows.iter().map(|r| &r.fields).collect();
        let original: Vec<&Vec<String>> = data.records.iter().map(|r| &r.fields).collect();
        assert_eq!(reparsed, original);
    }
}

#[test]
fn test_crlf_output_snapshot() {
    let data = dataset(vec![vec!["1", "20250101-0001", "a,b"]]);
    let options = WriteOptions {
        line_terminator: LineTerminator::Crlf,
        ..WriteOptions::default()
    };
    let bytes = serialize_dataset(&data, &options).unwrap();
    assert!(bytes.ends_with(b"\r\n"));
    let text = String::from_utf8(bytes).unwrap().replace("\r\n", "<CRLF>\n");
    insta::assert_snapshot!(text.trim_end(), @r#"
"id","registrationId","疾患名"<CRLF>
"1","20250101-0001","a,b"<CRLF>
"#);
}

#[test]
fn test_written_file_verifies_and_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed_planning_data.csv");
    let data = dataset(vec![
        vec!["1", "20250101-0001", "a；b"],
        vec!["2", "20250315-0002", "c"],
    ]);

    let first = write_dataset(&data, &path, &WriteOptions::default()).unwrap();
    let second = write_dataset(&data, &path, &WriteOptions::default()).unwrap();
    let (WriteOutcome::Committed { write: a, .. }, WriteOutcome::Committed { write: b, .. }) =
        (first, second)
    else {
        panic!("both writes should commit");
    };
    assert_eq!(a.sha256, b.sha256);
    assert_eq!(a.bytes_written, fs::metadata(&path).unwrap().len() as usize);

    let report = verify_file(&path, 3, LineTerminator::Lf).unwrap();
    assert!(report.passed());
    assert_eq!(report.records_checked, 3);

    let crlf = verify_file(&path, 3, LineTerminator::Crlf).unwrap();
    assert!(!crlf.passed());
    assert_eq!(crlf.terminator_violations.len(), 3);
}

#[test]
fn test_failed_write_keeps_canonical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed_planning_data.csv");
    fs::write(&path, "\"id\"\n\"1\"\n").unwrap();

    let options = WriteOptions {
        line_terminator: LineTerminator::Crlf,
        backup: true,
        ..WriteOptions::default()
    };
    let data = dataset(vec![vec!["1", "20250101-0001", "line\nbreak"]]);
    let outcome = write_dataset(&data, &path, &options).unwrap();

    let WriteOutcome::Rejected { verify } = outcome else {
        panic!("bare LF in CRLF output must be rejected");
    };
    assert_eq!(verify.terminator_violations.len(), 1);
    assert!(verify.column_violations.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "\"id\"\n\"1\"\n");
    // no backup is taken for a rejected write
    assert!(!dir.path().join("seed_planning_data.backup.csv").exists());
}
