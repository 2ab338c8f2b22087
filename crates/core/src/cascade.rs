use tracing::{debug, info};

use crate::record::RecordSet;
use crate::round::RenameMap;
use crate::tables::{fields, TableKind};

/// Rewrite every row referencing `old_id` through `subExternalId` to
/// `new_id`, across all subscription-referencing tables. Idempotent: a second
/// run with the same pair finds no row left at `old_id`.
pub fn cascade_rename(set: &mut RecordSet, old_id: &str, new_id: &str) -> usize {
    let mut updated = 0;
    for kind in TableKind::sub_referencing() {
        let Some(rows) = set.existing_table_mut(kind) else {
            continue;
        };
        for row in rows {
            if row.text(fields::SUB_EXTERNAL_ID) == Some(old_id) {
                row.set_text(fields::SUB_EXTERNAL_ID, new_id);
                updated += 1;
                debug!(table = kind.wire_name(), old_id, new_id, "reference rewritten");
            }
        }
    }
    if updated > 0 {
        info!(old_id, new_id, updated, "subscription rename cascaded");
    }
    updated
}

/// End-of-round sweep over the whole base set. Catches rows that live in
/// tables merged before the subscription table this round, and rows carried
/// over from a prior round under the stale identifier.
pub fn sweep_rename_map(set: &mut RecordSet, renames: &RenameMap) -> usize {
    let mut updated = 0;
    for (old_id, new_id) in renames.iter() {
        updated += cascade_rename(set, old_id, new_id);
    }
    updated
}
