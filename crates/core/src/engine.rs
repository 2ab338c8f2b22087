use tracing::{info, warn};

use crate::cascade;
use crate::crossref;
use crate::dedup;
use crate::errors::ReconcileError;
use crate::merge;
use crate::record::RecordSet;
use crate::related;
use crate::round::RoundContext;
use crate::subscription;
use crate::summary;
use crate::tables::{fields, TableKind};

/// Apply one amendment round, reading the contract identifier from the
/// delta's `Contractid` field.
pub fn reconcile(base: RecordSet, delta: &RecordSet) -> Result<RecordSet, ReconcileError> {
    reconcile_with_contract(base, delta, delta.contract_id.as_deref())
}

/// Apply one amendment round against `base`.
///
/// Without a contract identifier (the unmatched-document case) only the
/// delta's amendment log entries are appended; no table merge runs. A delta
/// missing the `output_records` key entirely leaves the base untouched; a
/// delta carrying an empty table list still runs the round, so its log
/// entries land and the summary note is composed. On error the partial
/// result is discarded; re-applying a completed round only re-runs the merge
/// policy's no-op path, so the caller may retry the whole round.
pub fn reconcile_with_contract(
    mut base: RecordSet,
    delta: &RecordSet,
    contract_external_id: Option<&str>,
) -> Result<RecordSet, ReconcileError> {
    let Some(contract_external_id) = contract_external_id else {
        warn!("delta carries no contract identifier, appending amendment logs only");
        base.amendment_logs.extend(delta.amendment_logs.iter().cloned());
        return Ok(base);
    };

    let Some(delta_tables) = delta.output_records.as_deref() else {
        warn!(contract_external_id, "delta carries no output records, base returned unchanged");
        return Ok(base);
    };

    info!(contract_external_id, tables = delta_tables.len(), "amendment round started");
    let mut ctx = RoundContext::new();

    base.amendment_logs.extend(delta.amendment_logs.iter().cloned());

    merge_contract(&mut base, delta, contract_external_id, &mut ctx);
    crossref::propagate_discount_ids(&mut base, delta);

    // Subscriptions first so the touched set and rename map exist before any
    // child table is considered, regardless of delta table order.
    for entry in delta_tables {
        if entry.data.is_empty() || TableKind::parse(&entry.name) != Some(TableKind::Subscription)
        {
            continue;
        }
        subscription::reconcile_subscriptions(
            &mut base,
            &entry.data,
            contract_external_id,
            &mut ctx,
        )?;
    }

    for entry in delta_tables {
        if entry.data.is_empty() {
            continue;
        }
        match TableKind::parse(&entry.name) {
            Some(TableKind::Contract) | Some(TableKind::Subscription) => {}
            Some(kind) => related::merge_related_table(&mut base, kind, &entry.data, &mut ctx),
            None => {
                info!(table = entry.name, rows = entry.data.len(), "unknown table appended");
                base.entry_mut(&entry.name).extend(entry.data.iter().cloned());
            }
        }
    }

    // Final full-set sweep after all table merges: no table may be left
    // referencing a superseded identifier.
    cascade::sweep_rename_map(&mut base, &ctx.renames);
    dedup::deduplicate(&mut base);
    summary::annotate_latest(&ctx.summary, &mut base);

    info!(
        contract_external_id,
        touched = ctx.touched_subscriptions.len(),
        renames = ctx.renames.iter().count(),
        "amendment round completed"
    );
    Ok(base)
}

fn merge_contract(
    base: &mut RecordSet,
    delta: &RecordSet,
    contract_external_id: &str,
    ctx: &mut RoundContext,
) {
    let Some(incoming) = delta.table(TableKind::Contract).and_then(|rows| rows.first()) else {
        return;
    };
    let Some(rows) = base.existing_table_mut(TableKind::Contract) else {
        warn!(contract_external_id, "base carries no Contract table");
        return;
    };
    let Some(existing) = rows
        .iter_mut()
        .find(|row| row.text(fields::CONTRACT_EXTERNAL_ID) == Some(contract_external_id))
    else {
        warn!(contract_external_id, "no base contract row matches the delta");
        return;
    };

    let changes = merge::merge_fields(existing, incoming, &[fields::ACCOUNT_NAME]);
    ctx.summary.contract_changes.extend(changes.iter().map(ToString::to_string));
}
