use tracing::{debug, warn};

use crate::merge;
use crate::record::{Record, RecordSet};
use crate::resolver;
use crate::round::RoundContext;
use crate::tables::{fields, Owner, TableKind};

/// Generic per-table reconciliation for child tables, driven by the
/// declarative [`crate::tables::TableSpec`] configuration.
///
/// Eligibility: discount-schedule rows only need their own identifier;
/// every other child row must belong to a subscription touched this round,
/// directly, after prefix normalization, or through the rename map. The
/// routine never removes rows; eligible rows are updated in place or
/// appended.
pub fn merge_related_table(
    base: &mut RecordSet,
    kind: TableKind,
    incoming: &[Record],
    ctx: &mut RoundContext,
) {
    let spec = kind.spec();
    let mut updated_count = 0usize;
    let mut added_count = 0usize;

    for new_record in incoming {
        let Some(mut new_record) = eligible_row(kind, new_record, ctx) else {
            continue;
        };

        if let Some(mapped) = new_record
            .text(fields::SUB_EXTERNAL_ID)
            .and_then(|sub_id| ctx.renames.resolve(sub_id))
            .map(str::to_owned)
        {
            new_record.to_mut().set_text(fields::SUB_EXTERNAL_ID, &mapped);
        }

        if let Some(id_field) = spec.id_field {
            if new_record.text(id_field).is_none() {
                warn!(table = spec.wire_name, id_field, "row without its external id dropped");
                continue;
            }
        }

        let matched = spec.id_field.and_then(|id_field| {
            resolver::resolve_match(
                base.table(kind).unwrap_or_default(),
                &new_record,
                id_field,
                spec.name_fields,
            )
        });

        match matched {
            Some(index) => {
                let existing = &mut base.table_mut(kind)[index];
                let changes = merge::merge_fields(existing, &new_record, &[]);
                debug!(table = spec.wire_name, index, changes = changes.len(), "row updated");
                updated_count += 1;
            }
            None => {
                base.table_mut(kind).push(new_record.into_owned());
                added_count += 1;
            }
        }
    }

    if updated_count > 0 || added_count > 0 {
        let note = format!("{updated_count} updated, {added_count} added");
        match kind {
            TableKind::LineItemSource => ctx.summary.line_item_changes.push(note),
            TableKind::DiscountSchedule => ctx.summary.discount_changes.push(note),
            _ => {}
        }
    }
}

/// Decide whether a child row participates in this round. Returns the row
/// (borrowed, cloned only when it must be rewritten) when eligible.
fn eligible_row<'a>(
    kind: TableKind,
    new_record: &'a Record,
    ctx: &RoundContext,
) -> Option<std::borrow::Cow<'a, Record>> {
    use std::borrow::Cow;

    let spec = kind.spec();
    if spec.owner == Owner::Independent {
        if new_record.text(fields::DISC_EXT_ID).is_some() {
            return Some(Cow::Borrowed(new_record));
        }
        warn!(table = spec.wire_name, "discount row without DiscExtId dropped");
        return None;
    }

    let Some(sub_id) = new_record.text(fields::SUB_EXTERNAL_ID) else {
        warn!(table = spec.wire_name, "row without subExternalId skipped");
        return None;
    };

    let touched = ctx
        .touched_subscriptions
        .iter()
        .any(|touched_id| resolver::same_identifier(touched_id, sub_id));
    if touched || ctx.renames.resolve(sub_id).is_some() {
        return Some(Cow::Borrowed(new_record));
    }

    warn!(
        table = spec.wire_name,
        sub_id, "row skipped, its subscription was not touched this round"
    );
    None
}
