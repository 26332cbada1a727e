//! Declared column schema and column references.
//!
//! Every pipeline stage looks columns up through a [`Schema`] instead of
//! hand-picked index literals. Configuration refers to columns with a
//! [`ColumnRef`], which is either a zero-based index or a header name.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Ordered column names of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ModelError::EmptySchema);
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns every row must have.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of the first column whose trimmed name equals `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns.iter().position(|column| column.trim() == wanted)
    }

    /// Display name for a column; unnamed columns render as `col<N>` (1-based).
    pub fn label(&self, index: usize) -> String {
        match self.columns.get(index) {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("col{}", index + 1),
        }
    }

    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Index(index) if *index < self.width() => Ok(*index),
            ColumnRef::Index(index) => Err(ModelError::ColumnOutOfRange {
                index: *index,
                width: self.width(),
            }),
            ColumnRef::Name(name) => self.index_of(name).ok_or_else(|| ModelError::UnknownColumn {
                name: name.clone(),
            }),
        }
    }

    pub fn resolve_all(&self, columns: &[ColumnRef]) -> Result<BTreeSet<usize>> {
        columns.iter().map(|column| self.resolve(column)).collect()
    }
}

/// Reference to a column by zero-based index or by header name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl FromStr for ColumnRef {
    type Err = Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        Ok(match trimmed.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(trimmed.to_string()),
        })
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Column positions a pipeline run works with, resolved against a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedColumns {
    /// Dedup key column.
    pub key: usize,
    /// Tiebreak column; absent when no stage needs it.
    pub tiebreak: Option<usize>,
    /// Column receiving the dense sequential identifier.
    pub id: usize,
    /// Multi-value columns whose delimiter characters are substituted.
    pub delimiter_sensitive: BTreeSet<usize>,
    /// Columns the field normalizer never touches.
    pub exempt: BTreeSet<usize>,
}
