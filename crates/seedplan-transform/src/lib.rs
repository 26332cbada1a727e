//! Reconciliation stages over an in-memory dataset snapshot.
//!
//! Each stage is deterministic and returns an explicit report instead of
//! accumulating state elsewhere:
//!
//! - [`reconcile`]: pad short rows, truncate (and report) long rows, enforce the
//!   canonical header
//! - [`dedupe`]: one row per key, greatest tiebreak wins, or deny-list removal
//! - [`normalize`]: collapse embedded line breaks, substitute delimiters in
//!   multi-value fields
//! - [`renumber`]: dense sequential identifiers in row order
//!
//! Running any stage on its own output changes nothing.

pub mod dedupe;
pub mod normalize;
pub mod reconcile;
pub mod renumber;

pub use dedupe::{Deduplicated, dedupe_dataset, deduplicate, deduplicate_denylist, duplicate_keys};
pub use normalize::{FieldNormalizer, normalize_dataset};
pub use reconcile::{blank_row_issues, reconcile_header, reconcile_row, reconcile_rows};
pub use renumber::renumber;
