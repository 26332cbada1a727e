//! Delimited-text loading.

mod reader;

pub use reader::{MAX_CSV_FILE_SIZE, RawTable, parse_table, read_table, read_table_with_limit};
