//! Run configuration: built-in defaults, then a TOML file, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use seedplan_model::{ColumnRef, DedupMode, LineTerminator, PipelineConfig};

/// Load a [`PipelineConfig`] from a TOML file.
///
/// Every key is optional; unknown keys are rejected so typos surface.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parse config {}", path.display()))
}

/// Parse TOML config text.
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig = toml::from_str(content)?;
    Ok(config)
}

/// Values given on the command line. `None` and empty lists leave the
/// loaded configuration untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub expected_columns: Option<usize>,
    pub key_column: Option<ColumnRef>,
    pub tiebreak_column: Option<ColumnRef>,
    pub id_column: Option<ColumnRef>,
    pub dedup_mode: Option<DedupMode>,
    pub denylist_keys: Vec<String>,
    pub delimiter_sensitive_columns: Vec<ColumnRef>,
    pub exempt_columns: Vec<ColumnRef>,
    pub line_terminator: Option<LineTerminator>,
    pub no_quote_all: bool,
    pub start_id: Option<u64>,
    pub backup: bool,
}

impl ConfigOverrides {
    /// Apply these overrides on top of `config`.
    ///
    /// List options replace the configured list rather than extending it.
    pub fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(expected) = self.expected_columns {
            config.expected_columns = Some(expected);
        }
        if self.key_column.is_some() {
            config.key_column = self.key_column;
        }
        if self.tiebreak_column.is_some() {
            config.tiebreak_column = self.tiebreak_column;
        }
        if self.id_column.is_some() {
            config.id_column = self.id_column;
        }
        if let Some(mode) = self.dedup_mode {
            config.dedup_mode = mode;
        }
        if !self.denylist_keys.is_empty() {
            config.denylist_keys = self.denylist_keys.into_iter().collect();
        }
        if !self.delimiter_sensitive_columns.is_empty() {
            config.delimiter_sensitive_columns = self.delimiter_sensitive_columns;
        }
        if !self.exempt_columns.is_empty() {
            config.exempt_columns = self.exempt_columns;
        }
        if let Some(terminator) = self.line_terminator {
            config.line_terminator = terminator;
        }
        if self.no_quote_all {
            config.quote_all = false;
        }
        if let Some(start_id) = self.start_id {
            config.start_id = start_id;
        }
        if self.backup {
            config.backup = true;
        }
        config
    }
}
