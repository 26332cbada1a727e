use std::path::PathBuf;

use serde::Serialize;

use seedplan_model::{PipelineReport, VerifyReport, WriteReport};

#[derive(Debug)]
pub struct CleanResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub pipeline: PipelineReport,
    pub outcome: WriteStatus,
}

impl CleanResult {
    pub fn has_errors(&self) -> bool {
        matches!(self.outcome, WriteStatus::Rejected(_))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteStatus {
    DryRun,
    Committed {
        write: WriteReport,
        verify: VerifyReport,
    },
    Rejected(VerifyReport),
}

/// JSON document written by `clean --report`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub input: &'a PathBuf,
    pub output: &'a PathBuf,
    pub pipeline: &'a PipelineReport,
    pub write: &'a WriteStatus,
}
