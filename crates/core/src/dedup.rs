use std::collections::BTreeMap;

use tracing::info;

use crate::record::{Record, RecordSet};
use crate::resolver;
use crate::tables::{DedupSpec, DEDUP_SPECS};

/// End-of-round duplicate collapse over the consumption schedule/rate tables.
///
/// Rows are grouped by the table's composite key; within a group the row
/// whose own external id carries the amended prefix wins, otherwise the first
/// row in table order. Re-running on an already-deduplicated table is a
/// no-op.
pub fn deduplicate(set: &mut RecordSet) {
    for spec in DEDUP_SPECS {
        let Some(rows) = set.existing_table_mut(spec.table) else {
            continue;
        };
        let removed = dedup_rows(rows, spec);
        if removed > 0 {
            info!(table = spec.table.wire_name(), removed, "duplicate rows collapsed");
        }
    }
}

fn dedup_rows(rows: &mut Vec<Record>, spec: DedupSpec) -> usize {
    let original_count = rows.len();
    let (first_field, second_field) = spec.key;

    // Group in first-seen key order so survivors keep their relative order.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: BTreeMap<(String, String), Vec<Record>> = BTreeMap::new();
    for row in rows.drain(..) {
        let key = (row.raw(first_field), row.raw(second_field));
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(row);
    }

    for key in order {
        let group = groups.remove(&key).unwrap_or_default();
        let winner = group
            .iter()
            .position(|row| row.text(spec.id_field).is_some_and(resolver::is_amended))
            .unwrap_or(0);
        if let Some(row) = group.into_iter().nth(winner) {
            rows.push(row);
        }
    }

    original_count - rows.len()
}
