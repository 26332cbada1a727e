//! CSV file reading with terminator unification.

use std::path::Path;

use ::csv::ReaderBuilder;
use seedplan_model::{Record, TerminatorCensus};

use crate::error::{IngestError, Result};

/// Maximum file size for snapshot loading (64 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 64 * 1024 * 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parsed snapshot before any reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// First record of the file, as found.
    pub header: Vec<String>,
    /// Data rows in file order, with their original widths.
    pub rows: Vec<Record>,
    /// Lines of rows whose fields were all blank; these are not in `rows`.
    pub blank_lines: Vec<usize>,
    /// Terminators seen in the raw bytes.
    pub terminators: TerminatorCensus,
    pub had_bom: bool,
}

/// Read and parse a snapshot from disk.
pub fn read_table(path: &Path) -> Result<RawTable> {
    read_table_with_limit(path, MAX_CSV_FILE_SIZE)
}

/// Read a snapshot, rejecting files larger than `max_size` bytes.
pub fn read_table_with_limit(path: &Path, max_size: u64) -> Result<RawTable> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let table = parse_table(&bytes, path)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        blank_rows = table.blank_lines.len(),
        crlf = table.terminators.crlf,
        lf = table.terminators.lf,
        cr = table.terminators.cr,
        "snapshot loaded"
    );
    Ok(table)
}

/// Parse snapshot bytes. `origin` is only used in error messages.
///
/// CRLF and bare CR are rewritten to LF before parsing, including inside
/// quoted fields, so mixed input parses as a single consistent format.
pub fn parse_table(bytes: &[u8], origin: &Path) -> Result<RawTable> {
    check_encoding(bytes, origin)?;
    let had_bom = bytes.starts_with(UTF8_BOM);
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(body).map_err(|e| IngestError::InvalidUtf8 {
        path: origin.to_path_buf(),
        valid_up_to: e.valid_up_to() + if had_bom { UTF8_BOM.len() } else { 0 },
    })?;

    let terminators = count_terminators(body);
    let unified = unify_terminators(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(unified.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut blank_lines = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::CsvParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(0);
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        if header.is_none() {
            header = Some(fields);
            continue;
        }
        let row = Record::new(line, fields);
        if row.is_blank() {
            blank_lines.push(line);
            continue;
        }
        rows.push(row);
    }

    let header = header.ok_or_else(|| IngestError::EmptyCsv {
        path: origin.to_path_buf(),
    })?;
    if header.iter().all(|name| name.trim().is_empty()) && rows.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: origin.to_path_buf(),
        });
    }

    Ok(RawTable {
        header,
        rows,
        blank_lines,
        terminators,
        had_bom,
    })
}

fn check_encoding(bytes: &[u8], origin: &Path) -> Result<()> {
    let encoding = if bytes.starts_with(&[0xFF, 0xFE]) {
        "UTF-16 LE"
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        "UTF-16 BE"
    } else {
        return Ok(());
    };
    Err(IngestError::UnsupportedEncoding {
        path: origin.to_path_buf(),
        encoding,
    })
}

fn count_terminators(bytes: &[u8]) -> TerminatorCensus {
    let mut census = TerminatorCensus::default();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\r' if bytes.get(idx + 1) == Some(&b'\n') => {
                census.crlf += 1;
                idx += 1;
            }
            b'\r' => census.cr += 1,
            b'\n' => census.lf += 1,
            _ => {}
        }
        idx += 1;
    }
    census
}

fn unify_terminators(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn io_error(path: &Path, source: std::io::Error) -> IngestError {
    if source.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }
}
