use tracing::{debug, info, warn};

use crate::cascade;
use crate::errors::ReconcileError;
use crate::merge;
use crate::record::{Record, RecordSet};
use crate::round::RoundContext;
use crate::tables::{fields, TableKind};

/// Match-or-append pass over the incoming Subscription rows.
///
/// Matching is by the natural business key `(ContractExternalId,
/// ProductName)`; round-generated `subExternalId`s are not stable across
/// rounds. A matched row adopts the incoming `subExternalId`
/// unconditionally; when that differs from the previous identifier, the
/// rename is recorded in the round context and cascaded immediately.
pub fn reconcile_subscriptions(
    base: &mut RecordSet,
    incoming: &[Record],
    contract_external_id: &str,
    ctx: &mut RoundContext,
) -> Result<(), ReconcileError> {
    for new_subscription in incoming {
        let Some(product_name) = new_subscription.text(fields::PRODUCT_NAME) else {
            warn!("subscription row without ProductName dropped, cannot be matched or keyed");
            continue;
        };
        let product_name = product_name.to_owned();

        let matched = find_subscription(base, contract_external_id, &product_name);
        match matched {
            Some(index) => {
                let rename = {
                    let existing = &mut base.table_mut(TableKind::Subscription)[index];
                    let old_id = existing.text(fields::SUB_EXTERNAL_ID).map(str::to_owned);

                    let changes =
                        merge::merge_fields(existing, new_subscription, &[fields::ACCOUNT_NAME]);
                    debug!(product_name, changes = changes.len(), "subscription fields merged");

                    // The incoming identifier becomes authoritative even when
                    // it equals the previous one.
                    let new_id = new_subscription.text(fields::SUB_EXTERNAL_ID).map(str::to_owned);
                    if let Some(new_id) = &new_id {
                        existing.set_text(fields::SUB_EXTERNAL_ID, new_id);
                    }
                    match (old_id, new_id) {
                        (Some(old), Some(new)) if old != new => Some((old, new)),
                        (_, new_id) => {
                            if let Some(new_id) = new_id {
                                ctx.touched_subscriptions.insert(new_id);
                            }
                            None
                        }
                    }
                };

                if let Some((old_id, new_id)) = rename {
                    info!(product_name, old_id, new_id, "subscription identifier renamed");
                    ctx.renames.insert(&old_id, &new_id)?;
                    cascade::cascade_rename(base, &old_id, &new_id);
                    ctx.touched_subscriptions.insert(new_id);
                }
                ctx.summary.subscriptions_updated.push(product_name);
            }
            None => {
                info!(product_name, "no existing subscription matched, appending");
                if let Some(new_id) = new_subscription.text(fields::SUB_EXTERNAL_ID) {
                    ctx.touched_subscriptions.insert(new_id.to_owned());
                }
                base.table_mut(TableKind::Subscription).push(new_subscription.clone());
                ctx.summary.subscriptions_added.push(product_name);
            }
        }
    }
    Ok(())
}

fn find_subscription(
    base: &RecordSet,
    contract_external_id: &str,
    product_name: &str,
) -> Option<usize> {
    base.table(TableKind::Subscription)?.iter().position(|row| {
        row.text(fields::CONTRACT_EXTERNAL_ID) == Some(contract_external_id)
            && row.text(fields::PRODUCT_NAME) == Some(product_name)
    })
}

#[cfg(test)]
mod tests {
    use super::reconcile_subscriptions;
    use crate::record::{Record, RecordSet};
    use crate::round::RoundContext;
    use crate::tables::TableKind;
    use crate::value::Scalar;

    fn row(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().map(|(field, value)| (field.to_string(), Scalar::from(*value))).collect()
    }

    fn base_with_subscription() -> RecordSet {
        let mut base = RecordSet::default();
        base.table_mut(TableKind::Subscription).push(row(&[
            ("ContractExternalId", "C-100"),
            ("ProductName", "Plan Pro"),
            ("subExternalId", "sub1_C"),
            ("AccountName", "Acme"),
            ("Quantity", "5"),
        ]));
        base
    }

    #[test]
    fn unmatched_product_is_appended_verbatim() {
        let mut base = base_with_subscription();
        let mut ctx = RoundContext::new();
        let incoming = vec![row(&[
            ("ContractExternalId", "C-100"),
            ("ProductName", "Plan Plus"),
            ("subExternalId", "sub2_C"),
        ])];
        reconcile_subscriptions(&mut base, &incoming, "C-100", &mut ctx).unwrap();

        let rows = base.table(TableKind::Subscription).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text("subExternalId"), Some("sub2_C"));
        assert!(ctx.touched_subscriptions.contains("sub2_C"));
        assert_eq!(ctx.summary.subscriptions_added, vec!["Plan Plus".to_owned()]);
    }

    #[test]
    fn matched_product_merges_and_adopts_the_incoming_identifier() {
        let mut base = base_with_subscription();
        let mut ctx = RoundContext::new();
        let incoming = vec![row(&[
            ("ContractExternalId", "C-100"),
            ("ProductName", "Plan Pro"),
            ("subExternalId", "amd_sub1_C"),
            ("AccountName", "NewCo"),
            ("Quantity", "8"),
        ])];
        reconcile_subscriptions(&mut base, &incoming, "C-100", &mut ctx).unwrap();

        let rows = base.table(TableKind::Subscription).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("subExternalId"), Some("amd_sub1_C"));
        assert_eq!(rows[0].text("Quantity"), Some("8"));
        // AccountName is protected against drift.
        assert_eq!(rows[0].text("AccountName"), Some("Acme"));
        assert_eq!(ctx.renames.resolve("sub1_C"), Some("amd_sub1_C"));
        assert!(ctx.touched_subscriptions.contains("amd_sub1_C"));
    }

    #[test]
    fn rename_cascades_into_child_tables_at_detection() {
        let mut base = base_with_subscription();
        base.table_mut(TableKind::LineItemSource)
            .push(row(&[("lisExternalId", "lis1"), ("subExternalId", "sub1_C")]));
        let mut ctx = RoundContext::new();
        let incoming = vec![row(&[
            ("ContractExternalId", "C-100"),
            ("ProductName", "Plan Pro"),
            ("subExternalId", "amd_sub1_C"),
        ])];
        reconcile_subscriptions(&mut base, &incoming, "C-100", &mut ctx).unwrap();

        let children = base.table(TableKind::LineItemSource).unwrap();
        assert_eq!(children[0].text("subExternalId"), Some("amd_sub1_C"));
    }

    #[test]
    fn rows_without_product_name_are_dropped() {
        let mut base = base_with_subscription();
        let mut ctx = RoundContext::new();
        let incoming = vec![row(&[("subExternalId", "sub9_C")])];
        reconcile_subscriptions(&mut base, &incoming, "C-100", &mut ctx).unwrap();
        assert_eq!(base.table(TableKind::Subscription).unwrap().len(), 1);
        assert!(ctx.touched_subscriptions.is_empty());
    }

    #[test]
    fn unchanged_identifier_still_counts_as_touched() {
        let mut base = base_with_subscription();
        let mut ctx = RoundContext::new();
        let incoming = vec![row(&[
            ("ContractExternalId", "C-100"),
            ("ProductName", "Plan Pro"),
            ("subExternalId", "sub1_C"),
        ])];
        reconcile_subscriptions(&mut base, &incoming, "C-100", &mut ctx).unwrap();
        assert!(ctx.renames.is_empty());
        assert!(ctx.touched_subscriptions.contains("sub1_C"));
        assert_eq!(ctx.summary.subscriptions_updated, vec!["Plan Pro".to_owned()]);
    }
}
