//! Key-based deduplication.
//!
//! Two policies, selectable per run:
//!
//! - **latest**: rows sharing a key collapse to the one with the greatest
//!   tiebreak value. Equal tiebreaks go to the row seen last in input order.
//!   The survivor takes the position of the key's first occurrence.
//! - **deny-list**: rows whose key is listed are removed outright, for keys
//!   known out-of-band to be copies of another surviving key.
//!
//! Registration keys are compared lexically. That equals chronological order
//! only for the fixed-width `YYYYMMDD-XXXX` format, so colliding values are
//! audited against it and non-conforming ones are reported.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use seedplan_model::{
    Dataset, DedupMode, DedupReport, Record, RegistrationKey, Removal, RemovalReason,
    ResolvedColumns, TiebreakFormat, TiebreakWarning,
};
use tracing::{debug, info, warn};

/// Result of a dedup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicated {
    pub survivors: Vec<Record>,
    pub removals: Vec<Removal>,
    /// Keys that had more than one row.
    pub collided_keys: usize,
    /// Rows for which `key_of` returned `None`.
    pub blank_keys: usize,
}

/// Collapse rows sharing a key to the one with the greatest tiebreak.
///
/// Rows whose key is `None` are never grouped and always survive. Output order
/// follows the first occurrence of each key; removals are listed in input order
/// of their group's first occurrence, then of the removed row.
pub fn deduplicate<K, T, FK, FT>(records: Vec<Record>, key_of: FK, tiebreak_of: FT) -> Deduplicated
where
    K: Eq + Hash + Display,
    T: Ord + Display,
    FK: Fn(&Record) -> Option<K>,
    FT: Fn(&Record) -> T,
{
    let keys: Vec<Option<K>> = records.iter().map(&key_of).collect();
    let tiebreaks: Vec<T> = records.iter().map(&tiebreak_of).collect();

    let mut groups: HashMap<&K, Vec<usize>> = HashMap::new();
    for (idx, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            groups.entry(key).or_default().push(idx);
        }
    }

    // first occurrence -> winner, and (loser, winner) pairs, both in input order
    let mut winner_at: HashMap<usize, usize> = HashMap::new();
    let mut losers: Vec<(usize, usize)> = Vec::new();
    let mut collided_keys = 0;
    for (idx, key) in keys.iter().enumerate() {
        let Some(key) = key else {
            continue;
        };
        let members = &groups[key];
        if members[0] != idx {
            continue;
        }
        let mut winner = idx;
        for &candidate in &members[1..] {
            if tiebreaks[candidate] >= tiebreaks[winner] {
                winner = candidate;
            }
        }
        if members.len() > 1 {
            collided_keys += 1;
            losers.extend(
                members
                    .iter()
                    .filter(|&&member| member != winner)
                    .map(|&member| (member, winner)),
            );
        }
        winner_at.insert(idx, winner);
    }

    let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
    let mut removals = Vec::with_capacity(losers.len());
    for (loser, winner) in losers {
        let (Some(removed), Some(key)) = (slots[loser].take(), keys[loser].as_ref()) else {
            continue;
        };
        debug!(
            key = %key,
            removed_line = removed.line,
            kept_line = slots[winner].as_ref().map_or(0, |row| row.line),
            "duplicate superseded"
        );
        removals.push(Removal {
            key: key.to_string(),
            removed,
            survivor: slots[winner].clone(),
            reason: RemovalReason::Superseded {
                discarded_tiebreak: tiebreaks[loser].to_string(),
                kept_tiebreak: tiebreaks[winner].to_string(),
            },
        });
    }

    let mut survivors = Vec::with_capacity(slots.len() - removals.len());
    let mut blank_keys = 0;
    for idx in 0..keys.len() {
        if keys[idx].is_none() {
            blank_keys += 1;
            survivors.extend(slots[idx].take());
        } else if let Some(&winner) = winner_at.get(&idx) {
            survivors.extend(slots[winner].take());
        }
    }

    Deduplicated {
        survivors,
        removals,
        collided_keys,
        blank_keys,
    }
}

/// Remove every row whose key is on the deny-list.
pub fn deduplicate_denylist(
    records: Vec<Record>,
    columns: &ResolvedColumns,
    denylist: &BTreeSet<String>,
) -> (Vec<Record>, Vec<Removal>) {
    let mut survivors = Vec::with_capacity(records.len());
    let mut removals = Vec::new();
    for record in records {
        let key = record.key(columns).to_string();
        if denylist.contains(&key) {
            debug!(key = %key, line = record.line, "deny-listed row removed");
            removals.push(Removal {
                key,
                removed: record,
                survivor: None,
                reason: RemovalReason::Denylisted,
            });
        } else {
            survivors.push(record);
        }
    }
    (survivors, removals)
}

/// Keys occurring more than once, sorted. Blank keys are ignored.
pub fn duplicate_keys(records: &[Record], columns: &ResolvedColumns) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let key = record.key(columns);
        if !key.is_empty() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key.to_string())
        .collect()
}

/// Tiebreak values of colliding rows that are not canonical registration keys.
fn audit_tiebreaks(records: &[Record], columns: &ResolvedColumns) -> Vec<TiebreakWarning> {
    let colliding: BTreeSet<String> = duplicate_keys(records, columns).into_iter().collect();
    records
        .iter()
        .filter(|record| colliding.contains(record.key(columns)))
        .filter_map(|record| {
            let value = record.registration_key(columns)?;
            if RegistrationKey::new(value).is_canonical() {
                return None;
            }
            Some(TiebreakWarning {
                line: record.line,
                key: record.key(columns).to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Apply the configured dedup policy to a dataset in place.
pub fn dedupe_dataset(
    dataset: &mut Dataset,
    columns: &ResolvedColumns,
    mode: DedupMode,
    denylist: &BTreeSet<String>,
    tiebreak_format: TiebreakFormat,
) -> DedupReport {
    let mut report = DedupReport {
        input_rows: dataset.len(),
        ..DedupReport::default()
    };
    let mut records = std::mem::take(&mut dataset.records);

    if mode.uses_denylist() {
        let (kept, removed) = deduplicate_denylist(records, columns, denylist);
        records = kept;
        report.removals.extend(removed);
    }

    if mode.uses_tiebreak() {
        if tiebreak_format == TiebreakFormat::Registration {
            report.format_warnings = audit_tiebreaks(&records, columns);
            for warning in &report.format_warnings {
                warn!(
                    line = warning.line,
                    key = %warning.key,
                    "tiebreak value is not a fixed-width registration key; lexical order may not be chronological"
                );
            }
        }
        let outcome = deduplicate(
            records,
            |record| {
                let key = record.key(columns);
                (!key.is_empty()).then(|| key.to_string())
            },
            |record| record.registration_key(columns).unwrap_or("").to_string(),
        );
        records = outcome.survivors;
        report.collided_keys = outcome.collided_keys;
        report.blank_keys = outcome.blank_keys;
        report.removals.extend(outcome.removals);
    } else {
        report.blank_keys = records
            .iter()
            .filter(|record| record.key(columns).is_empty())
            .count();
        report.remaining_duplicates = duplicate_keys(&records, columns);
        if !report.remaining_duplicates.is_empty() {
            warn!(
                keys = ?report.remaining_duplicates,
                "duplicate keys remain after deny-list removal"
            );
        }
    }

    report.output_rows = records.len();
    dataset.records = records;
    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        collided_keys = report.collided_keys,
        removed = report.removed_count(),
        "deduplication complete"
    );
    report
}
