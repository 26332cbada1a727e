//! Canonical file writing.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use seedplan_model::{Dataset, LineTerminator, PipelineConfig, VerifyReport, WriteReport};

use crate::error::{OutputError, Result};
use crate::hash::sha256_hex;
use crate::verify::verify_file;

/// Serialization and replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Quote every field rather than only those that need it.
    pub quote_all: bool,
    pub line_terminator: LineTerminator,
    /// Copy an existing canonical file aside before replacing it.
    pub backup: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            quote_all: true,
            line_terminator: LineTerminator::Lf,
            backup: false,
        }
    }
}

impl WriteOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            quote_all: config.quote_all,
            line_terminator: config.line_terminator,
            backup: config.backup,
        }
    }
}

/// Result of [`write_dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Output verified and installed at the canonical path.
    Committed {
        write: WriteReport,
        verify: VerifyReport,
    },
    /// Output failed verification; the canonical file was not touched.
    Rejected { verify: VerifyReport },
}

impl WriteOutcome {
    pub fn verify_report(&self) -> &VerifyReport {
        match self {
            Self::Committed { verify, .. } | Self::Rejected { verify } => verify,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Serialize header and rows. No byte-order mark is written.
///
/// Fails if a row's width differs from the header's.
pub fn serialize_dataset(dataset: &Dataset, options: &WriteOptions) -> Result<Vec<u8>> {
    let quote_style = if options.quote_all {
        QuoteStyle::Always
    } else {
        QuoteStyle::Necessary
    };
    let terminator = match options.line_terminator {
        LineTerminator::Lf => Terminator::Any(b'\n'),
        LineTerminator::Crlf => Terminator::CRLF,
    };
    let mut writer = WriterBuilder::new()
        .quote_style(quote_style)
        .terminator(terminator)
        .from_writer(Vec::new());
    writer.write_record(dataset.header())?;
    for record in &dataset.records {
        writer.write_record(&record.fields)?;
    }
    writer.into_inner().map_err(|e| OutputError::Csv {
        message: e.error().to_string(),
    })
}

/// Sibling temp path: `<file name>.tmp` in the target's directory.
pub fn temp_path(path: &Path) -> Result<PathBuf> {
    sibling_with_suffix(path, ".tmp")
}

/// Backup path: `<stem>.backup.<ext>` in the target's directory.
pub fn backup_path(path: &Path) -> Result<PathBuf> {
    let stem = path.file_stem().ok_or_else(|| OutputError::InvalidTarget {
        path: path.to_path_buf(),
    })?;
    let mut name = OsString::from(stem);
    name.push(".backup");
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(path.with_file_name(name))
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| OutputError::InvalidTarget {
        path: path.to_path_buf(),
    })?;
    let mut name = file_name.to_os_string();
    name.push(suffix);
    Ok(path.with_file_name(name))
}

/// Write `dataset` to `path` atomically, verifying before install.
///
/// The bytes go to a sibling temp file which is synced, re-read and verified.
/// Only a passing file is renamed over `path`; a failing one is deleted and
/// reported as [`WriteOutcome::Rejected`].
pub fn write_dataset(dataset: &Dataset, path: &Path, options: &WriteOptions) -> Result<WriteOutcome> {
    let bytes = serialize_dataset(dataset, options)?;
    let temp_path = temp_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io("create directory", parent, e))?;
    }

    let mut file = File::create(&temp_path).map_err(|e| OutputError::io("create", &temp_path, e))?;
    file.write_all(&bytes)
        .map_err(|e| OutputError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| OutputError::io("sync", &temp_path, e))?;
    drop(file);

    let verify = match verify_file(&temp_path, dataset.width(), options.line_terminator) {
        Ok(report) => report,
        Err(e) => {
            discard(&temp_path);
            return Err(e);
        }
    };
    if !verify.passed() {
        tracing::warn!(
            path = %path.display(),
            column_violations = verify.column_violations.len(),
            terminator_violations = verify.terminator_violations.len(),
            "output failed verification; canonical file left unchanged"
        );
        discard(&temp_path);
        return Ok(WriteOutcome::Rejected { verify });
    }

    let backup = if options.backup && path.exists() {
        let backup = backup_path(path)?;
        fs::copy(path, &backup).map_err(|e| OutputError::io("back up", &backup, e))?;
        tracing::info!(backup = %backup.display(), "previous canonical file backed up");
        Some(backup)
    } else {
        None
    };

    if let Err(source) = fs::rename(&temp_path, path) {
        discard(&temp_path);
        return Err(OutputError::AtomicWriteFailed {
            temp_path,
            target_path: path.to_path_buf(),
            source,
        });
    }

    let write = WriteReport {
        path: path.to_path_buf(),
        rows_written: dataset.len(),
        bytes_written: bytes.len(),
        sha256: sha256_hex(&bytes),
        line_terminator: options.line_terminator,
        quote_all: options.quote_all,
        backup,
    };
    tracing::info!(
        path = %path.display(),
        rows = write.rows_written,
        bytes = write.bytes_written,
        sha256 = %write.sha256,
        "canonical file written"
    );
    Ok(WriteOutcome::Committed { write, verify })
}

fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path) {
        tracing::warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedplan_model::{Record, Schema};
    use tempfile::tempdir;

    fn dataset(rows: &[&[&str]]) -> Dataset {
        let schema = Schema::new(vec!["id".to_string(), "name".to_string()]).unwrap();
        let records = rows
            .iter()
            .enumerate()
            .map(|(idx, fields)| {
                Record::new(idx + 2, fields.iter().map(|s| (*s).to_string()).collect())
            })
            .collect();
        Dataset::new(schema, records)
    }

    #[test]
    fn test_quote_all_lf() {
        let bytes = serialize_dataset(&dataset(&[&["1", "a"]]), &WriteOptions::default()).unwrap();
        assert_eq!(bytes, b"\"id\",\"name\"\n\"1\",\"a\"\n");
    }

    #[test]
    fn test_minimal_quoting_crlf() {
        let options = WriteOptions {
            quote_all: false,
            line_terminator: LineTerminator::Crlf,
            backup: false,
        };
        let bytes = serialize_dataset(&dataset(&[&["1", "a,b"]]), &options).unwrap();
        assert_eq!(bytes, b"id,name\r\n1,\"a,b\"\r\n");
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        let bytes =
            serialize_dataset(&dataset(&[&["1", "say \"hi\""]]), &WriteOptions::default()).unwrap();
        assert_eq!(bytes, b"\"id\",\"name\"\n\"1\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_ragged_dataset_is_rejected_by_serializer() {
        let result = serialize_dataset(&dataset(&[&["1"]]), &WriteOptions::default());
        assert!(matches!(result, Err(OutputError::Csv { .. })));
    }

    #[test]
    fn test_write_replaces_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seed_planning_data.csv");
        fs::write(&path, b"old").unwrap();

        let outcome = write_dataset(&dataset(&[&["1", "a"]]), &path, &WriteOptions::default()).unwrap();
        let WriteOutcome::Committed { write, verify } = outcome else {
            panic!("expected committed outcome");
        };
        assert!(verify.passed());
        assert_eq!(write.rows_written, 1);
        assert_eq!(write.backup, None);
        assert_eq!(fs::read(&path).unwrap(), b"\"id\",\"name\"\n\"1\",\"a\"\n");
        assert_eq!(write.sha256, sha256_hex(&fs::read(&path).unwrap()));
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[test]
    fn test_backup_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seed_planning_data.csv");
        fs::write(&path, b"previous").unwrap();
        let options = WriteOptions {
            backup: true,
            ..WriteOptions::default()
        };
        let outcome = write_dataset(&dataset(&[&["1", "a"]]), &path, &options).unwrap();
        let WriteOutcome::Committed { write, .. } = outcome else {
            panic!("expected committed outcome");
        };
        let backup = write.backup.unwrap();
        assert_eq!(backup, dir.path().join("seed_planning_data.backup.csv"));
        assert_eq!(fs::read(&backup).unwrap(), b"previous");
    }

    #[test]
    fn test_rejected_output_leaves_canonical_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, b"canonical").unwrap();
        // a CR inside a field is a foreign terminator for LF output
        let outcome =
            write_dataset(&dataset(&[&["1", "a\rb"]]), &path, &WriteOptions::default()).unwrap();
        assert!(!outcome.is_committed());
        assert_eq!(outcome.verify_report().terminator_violations.len(), 1);
        assert_eq!(fs::read(&path).unwrap(), b"canonical");
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let outcome = write_dataset(&dataset(&[]), &path, &WriteOptions::default()).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(fs::read(&path).unwrap(), b"\"id\",\"name\"\n");
    }

    #[test]
    fn test_paths() {
        let path = Path::new("/data/seed_planning_data.csv");
        assert_eq!(
            temp_path(path).unwrap(),
            PathBuf::from("/data/seed_planning_data.csv.tmp")
        );
        assert_eq!(
            backup_path(path).unwrap(),
            PathBuf::from("/data/seed_planning_data.backup.csv")
        );
        assert_eq!(
            backup_path(Path::new("plain")).unwrap(),
            PathBuf::from("plain.backup")
        );
    }
}
