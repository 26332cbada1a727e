use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("column index {index} is out of range for a schema of {width} columns")]
    ColumnOutOfRange { index: usize, width: usize },
    #[error("column '{name}' is not declared in the schema")]
    UnknownColumn { name: String },
    #[error("missing required configuration: {option}")]
    MissingOption { option: &'static str },
    #[error("expected_columns is {expected} but the canonical header declares {header} columns")]
    WidthConflict { expected: usize, header: usize },
    #[error("schema width must be at least 1")]
    EmptySchema,
    #[error("{option} must not be a delimiter, quote or line-break character (got {value:?})")]
    InvalidMarker { option: &'static str, value: char },
    #[error(
        "denylist_keys match column {column}, which renumbering rewrites; set id_column to a different column"
    )]
    DenylistOnRenumberedColumn { column: usize },
    #[error("start_id {start_id} leaves no room for {rows} sequential identifiers")]
    IdRangeOverflow { start_id: u64, rows: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
