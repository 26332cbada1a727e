//! CLI argument definitions for seedplan.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use seedplan_cli::config::ConfigOverrides;
use seedplan_model::{ColumnRef, DedupMode, LineTerminator};

#[derive(Parser)]
#[command(
    name = "seedplan",
    version,
    about = "Reconcile recruitment-planning CSV snapshots into a canonical file",
    long_about = "Reconcile recruitment-planning CSV snapshots into a canonical file.\n\n\
                  Repairs row widths, resolves duplicate keys, escapes embedded line\n\
                  breaks and delimiters, renumbers identifiers, and replaces the\n\
                  canonical file atomically after verifying the new content."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow field values in trace logs (they are redacted otherwise).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline and replace the canonical file.
    Clean(CleanArgs),

    /// Check an existing file's column counts and line terminators.
    Verify(VerifyArgs),
}

#[derive(Parser)]
pub struct CleanArgs {
    /// Snapshot to reconcile.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Canonical file to write (default: overwrite INPUT).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// TOML configuration file; flags below override its values.
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Schema width every row is brought to.
    #[arg(long = "expected-columns", value_name = "N")]
    pub expected_columns: Option<usize>,

    /// Dedup key column (index or header name).
    #[arg(long = "key-column", value_name = "COLUMN")]
    pub key_column: Option<ColumnRef>,

    /// Column whose greatest value wins a dedup collision.
    #[arg(long = "tiebreak-column", value_name = "COLUMN")]
    pub tiebreak_column: Option<ColumnRef>,

    /// Column to renumber (default: the key column).
    #[arg(long = "id-column", value_name = "COLUMN")]
    pub id_column: Option<ColumnRef>,

    /// How rows sharing a key are resolved.
    #[arg(long = "dedup-mode", value_enum)]
    pub dedup_mode: Option<DedupModeArg>,

    /// Key removed unconditionally in deny-list modes (repeatable).
    /// Requires an id column other than the key column.
    #[arg(long = "denylist", value_name = "KEY", value_delimiter = ',')]
    pub denylist: Vec<String>,

    /// Multi-value column whose delimiters are substituted (repeatable).
    #[arg(long = "delimiter-sensitive", value_name = "COLUMN")]
    pub delimiter_sensitive: Vec<ColumnRef>,

    /// Column the field normalizer leaves untouched (repeatable). Its line
    /// breaks are written as-is, which fails CRLF verification.
    #[arg(long = "exempt", value_name = "COLUMN")]
    pub exempt: Vec<ColumnRef>,

    /// Line terminator of the written file.
    #[arg(long = "line-terminator", value_enum)]
    pub line_terminator: Option<LineTerminatorArg>,

    /// Quote only fields that need it instead of every field.
    #[arg(long = "no-quote-all")]
    pub no_quote_all: bool,

    /// First identifier assigned by renumbering.
    #[arg(long = "start-id", value_name = "N")]
    pub start_id: Option<u64>,

    /// Copy the existing canonical file to `<stem>.backup.<ext>` first.
    #[arg(long = "backup")]
    pub backup: bool,

    /// Run every stage and report without writing anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write the full run report as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl CleanArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            expected_columns: self.expected_columns,
            key_column: self.key_column.clone(),
            tiebreak_column: self.tiebreak_column.clone(),
            id_column: self.id_column.clone(),
            dedup_mode: self.dedup_mode.map(Into::into),
            denylist_keys: self.denylist.clone(),
            delimiter_sensitive_columns: self.delimiter_sensitive.clone(),
            exempt_columns: self.exempt.clone(),
            line_terminator: self.line_terminator.map(Into::into),
            no_quote_all: self.no_quote_all,
            start_id: self.start_id,
            backup: self.backup,
        }
    }
}

#[derive(Parser)]
pub struct VerifyArgs {
    /// File to check.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Required number of fields per record, header included.
    #[arg(long = "expected-columns", value_name = "N")]
    pub expected_columns: usize,

    /// Line terminator the file must use throughout.
    #[arg(long = "line-terminator", value_enum, default_value = "lf")]
    pub line_terminator: LineTerminatorArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DedupModeArg {
    Latest,
    Denylist,
    DenylistThenLatest,
}

impl From<DedupModeArg> for DedupMode {
    fn from(arg: DedupModeArg) -> Self {
        match arg {
            DedupModeArg::Latest => Self::Latest,
            DedupModeArg::Denylist => Self::Denylist,
            DedupModeArg::DenylistThenLatest => Self::DenylistThenLatest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LineTerminatorArg {
    Lf,
    Crlf,
}

impl From<LineTerminatorArg> for LineTerminator {
    fn from(arg: LineTerminatorArg) -> Self {
        match arg {
            LineTerminatorArg::Lf => Self::Lf,
            LineTerminatorArg::Crlf => Self::Crlf,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
