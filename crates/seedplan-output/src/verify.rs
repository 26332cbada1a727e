//! Post-write verification.
//!
//! Re-parses serialized output and checks that every record (header included)
//! has the expected width and that the raw bytes contain no terminator other
//! than the configured one. Line breaks inside quoted fields count: consumers
//! that ignore quoting would split on them.

use std::path::Path;

use csv::ReaderBuilder;
use seedplan_model::{
    ColumnViolation, LineTerminator, TerminatorKind, TerminatorViolation, VerifyReport,
};

use crate::error::{OutputError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Verify serialized output held in memory.
pub fn verify_bytes(
    bytes: &[u8],
    expected_columns: usize,
    expected_terminator: LineTerminator,
) -> VerifyReport {
    let mut report = VerifyReport::new(expected_columns, expected_terminator);
    report.bom_present = bytes.starts_with(UTF8_BOM);
    report.terminator_violations = scan_terminators(bytes, expected_terminator);

    if let Err(e) = std::str::from_utf8(bytes) {
        report.parse_error = Some(format!("invalid UTF-8 at byte {}", e.valid_up_to()));
        return report;
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    for result in reader.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                report.parse_error = Some(e.to_string());
                break;
            }
        };
        report.records_checked += 1;
        if record.len() != expected_columns {
            report.column_violations.push(ColumnViolation {
                record: report.records_checked,
                found: record.len(),
            });
        }
    }
    if report.records_checked == 0 && report.parse_error.is_none() {
        report.parse_error = Some("output contains no records".to_string());
    }
    report
}

/// Read `path` and verify it.
pub fn verify_file(
    path: &Path,
    expected_columns: usize,
    expected_terminator: LineTerminator,
) -> Result<VerifyReport> {
    let bytes = std::fs::read(path).map_err(|e| OutputError::io("read", path, e))?;
    let report = verify_bytes(&bytes, expected_columns, expected_terminator);
    tracing::debug!(
        path = %path.display(),
        records = report.records_checked,
        column_violations = report.column_violations.len(),
        terminator_violations = report.terminator_violations.len(),
        passed = report.passed(),
        "output verified"
    );
    Ok(report)
}

fn scan_terminators(bytes: &[u8], expected: LineTerminator) -> Vec<TerminatorViolation> {
    let mut violations = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        let kind = match bytes[idx] {
            b'\r' if bytes.get(idx + 1) == Some(&b'\n') => Some(TerminatorKind::Crlf),
            b'\r' => Some(TerminatorKind::Cr),
            b'\n' => Some(TerminatorKind::Lf),
            _ => None,
        };
        if let Some(kind) = kind {
            if !kind.matches(expected) {
                violations.push(TerminatorViolation {
                    byte_offset: idx,
                    found: kind,
                });
            }
            if kind == TerminatorKind::Crlf {
                idx += 1;
            }
        }
        idx += 1;
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lf_output_passes() {
        let report = verify_bytes(b"\"a\",\"b\"\n\"1\",\"2\"\n", 2, LineTerminator::Lf);
        assert!(report.passed());
        assert_eq!(report.records_checked, 2);
    }

    #[test]
    fn test_clean_crlf_output_passes() {
        let report = verify_bytes(b"\"a\",\"b\"\r\n\"1\",\"2\"\r\n", 2, LineTerminator::Crlf);
        assert!(report.passed());
    }

    #[test]
    fn test_wrong_width_reported_by_record() {
        let report = verify_bytes(b"a,b\n1,2,3\n4\n", 2, LineTerminator::Lf);
        assert!(!report.passed());
        assert_eq!(
            report.column_violations,
            vec![
                ColumnViolation {
                    record: 2,
                    found: 3
                },
                ColumnViolation {
                    record: 3,
                    found: 1
                },
            ]
        );
    }

    #[test]
    fn test_crlf_in_lf_output() {
        let report = verify_bytes(b"a,b\r\n1,2\n", 2, LineTerminator::Lf);
        assert_eq!(report.terminator_violations.len(), 1);
        assert_eq!(report.terminator_violations[0].byte_offset, 3);
        assert_eq!(report.terminator_violations[0].found, TerminatorKind::Crlf);
    }

    #[test]
    fn test_bare_lf_in_crlf_output() {
        let report = verify_bytes(b"a,b\r\n\"x\ny\",2\r\n", 2, LineTerminator::Crlf);
        assert_eq!(report.column_violations.len(), 0);
        assert_eq!(report.terminator_violations.len(), 1);
        assert_eq!(report.terminator_violations[0].found, TerminatorKind::Lf);
    }

    #[test]
    fn test_bare_cr_detected() {
        let report = verify_bytes(b"a,b\n\"x\ry\",2\n", 2, LineTerminator::Lf);
        assert_eq!(report.terminator_violations[0].found, TerminatorKind::Cr);
    }

    #[test]
    fn test_bom_fails_verification() {
        let report = verify_bytes(b"\xEF\xBB\xBFa,b\n", 2, LineTerminator::Lf);
        assert!(report.bom_present);
        assert!(!report.passed());
    }

    #[test]
    fn test_empty_output_fails() {
        let report = verify_bytes(b"", 2, LineTerminator::Lf);
        assert!(report.parse_error.is_some());
        assert!(!report.passed());
    }
}
