//! Canonical CSV output.
//!
//! Serializes a reconciled dataset with a single quoting policy and line
//! terminator, materializes it next to the target, re-reads and verifies it,
//! and only then renames it over the canonical file. A failed verification or
//! a crash mid-write leaves the previous canonical file intact.

pub mod error;
pub mod hash;
pub mod verify;
pub mod writer;

pub use error::{OutputError, Result};
pub use hash::sha256_hex;
pub use verify::{verify_bytes, verify_file};
pub use writer::{WriteOptions, WriteOutcome, backup_path, serialize_dataset, temp_path, write_dataset};
