//! Dense identifier reassignment.

use seedplan_model::{Record, RenumberReport, Result, id_range_end};
use tracing::info;

/// Assign `start_at, start_at + 1, ...` to `id_column` in current row order.
///
/// Rows already carrying the right identifier are left untouched, so running
/// this on its own output reports zero reassignments. Fails without touching
/// any row when the range would pass `u64::MAX`.
pub fn renumber(
    records: &mut [Record],
    id_column: usize,
    start_at: u64,
) -> Result<RenumberReport> {
    let end_id = id_range_end(start_at, records.len())?;
    let mut reassigned = 0;
    for (next, record) in (start_at..=end_id.unwrap_or(start_at)).zip(records.iter_mut()) {
        let id = next.to_string();
        if record.field(id_column) != id {
            record.set_field(id_column, id);
            reassigned += 1;
        }
    }
    info!(start_id = start_at, ?end_id, reassigned, "identifiers renumbered");
    Ok(RenumberReport {
        start_id: start_at,
        end_id,
        reassigned,
    })
}
