use tracing::info;

use crate::record::RecordSet;
use crate::resolver;
use crate::tables::{fields, TableKind};

/// Propagate amended discount-schedule identifiers into the base set.
///
/// Discount identifiers follow the same amended-prefix convention as
/// subscription identifiers but sit outside the subscription rename cascade:
/// a `DiscExtId` links a Subscription row to its discount schedule directly.
/// For every incoming discount-schedule row carrying an amended identifier,
/// rewrite base rows (discount schedule and Subscription alike) still holding
/// the original identifier.
pub fn propagate_discount_ids(base: &mut RecordSet, delta: &RecordSet) -> usize {
    let mappings: Vec<(String, String)> = delta
        .table(TableKind::DiscountSchedule)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| row.text(fields::DISC_EXT_ID))
        .filter(|id| resolver::is_amended(id))
        .map(|amended| (resolver::strip_amended_prefix(amended).to_owned(), amended.to_owned()))
        .collect();

    if mappings.is_empty() {
        return 0;
    }

    let mut updated = 0;
    for kind in [TableKind::DiscountSchedule, TableKind::Subscription] {
        let Some(rows) = base.existing_table_mut(kind) else {
            continue;
        };
        for row in rows {
            let Some(current) = row.text(fields::DISC_EXT_ID) else { continue };
            if let Some((_, amended)) =
                mappings.iter().find(|(original, _)| original == current)
            {
                let amended = amended.clone();
                row.set_text(fields::DISC_EXT_ID, &amended);
                updated += 1;
            }
        }
    }
    if updated > 0 {
        info!(updated, "discount identifiers propagated");
    }
    updated
}
