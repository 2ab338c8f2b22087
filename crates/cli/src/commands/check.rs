use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use amendex_core::{same_identifier, RecordSet, TableKind, DEDUP_SPECS};

use crate::commands::{load_record_set, CommandResult};

#[derive(Debug, Serialize)]
struct DanglingReference {
    table: &'static str,
    field: &'static str,
    value: String,
    /// `stale_prefix` when an owner exists only under the amended form of
    /// this identifier, `missing_owner` when no owner exists at all.
    class: &'static str,
}

#[derive(Debug, Serialize)]
struct DuplicateKey {
    table: &'static str,
    key: String,
    rows: usize,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    command: &'static str,
    status: &'static str,
    file: String,
    dangling_references: Vec<DanglingReference>,
    duplicate_keys: Vec<DuplicateKey>,
}

/// Audit the invariants the reconciliation engine guarantees after a round:
/// every child-table reference resolves to an owner, and the deduplicated
/// tables hold at most one row per composite key.
pub fn run(path: &Path) -> CommandResult {
    let set = match load_record_set(path) {
        Ok(set) => set,
        Err(error) => return CommandResult::failure("check", "load_failed", format!("{error:#}")),
    };

    let dangling_references = dangling_references(&set);
    let duplicate_keys = duplicate_keys(&set);
    let clean = dangling_references.is_empty() && duplicate_keys.is_empty();

    let report = CheckReport {
        command: "check",
        status: if clean { "ok" } else { "violations" },
        file: path.display().to_string(),
        dangling_references,
        duplicate_keys,
    };
    let mut result = CommandResult::report(report);
    if !clean {
        result.exit_code = 1;
    }
    result
}

fn dangling_references(set: &RecordSet) -> Vec<DanglingReference> {
    let subscription_ids: Vec<String> = ids_of(set, TableKind::Subscription, "subExternalId");
    let discount_ids: Vec<String> = ids_of(set, TableKind::DiscountSchedule, "DiscExtId");

    let mut dangling = Vec::new();
    for kind in TableKind::sub_referencing() {
        let Some(rows) = set.table(kind) else { continue };
        for row in rows {
            let Some(sub_id) = row.text("subExternalId") else { continue };
            if let Some(class) = classify(&subscription_ids, sub_id) {
                dangling.push(DanglingReference {
                    table: kind.wire_name(),
                    field: "subExternalId",
                    value: sub_id.to_owned(),
                    class,
                });
            }
        }
    }

    if let Some(rows) = set.table(TableKind::Subscription) {
        for row in rows {
            let Some(disc_id) = row.text("DiscExtId") else { continue };
            if let Some(class) = classify(&discount_ids, disc_id) {
                dangling.push(DanglingReference {
                    table: TableKind::Subscription.wire_name(),
                    field: "DiscExtId",
                    value: disc_id.to_owned(),
                    class,
                });
            }
        }
    }
    dangling
}

/// A reference only resolves through an exact owner: the rename cascade is
/// expected to have rewritten every row, so a reference that matches an owner
/// only modulo the amended prefix is a leftover, not a match.
fn classify(owner_ids: &[String], reference: &str) -> Option<&'static str> {
    if owner_ids.iter().any(|known| known == reference) {
        return None;
    }
    if owner_ids.iter().any(|known| same_identifier(known, reference)) {
        Some("stale_prefix")
    } else {
        Some("missing_owner")
    }
}

fn duplicate_keys(set: &RecordSet) -> Vec<DuplicateKey> {
    let mut duplicates = Vec::new();
    for spec in DEDUP_SPECS {
        let Some(rows) = set.table(spec.table) else { continue };
        let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
        for row in rows {
            let key = (row.raw(spec.key.0), row.raw(spec.key.1));
            *counts.entry(key).or_default() += 1;
        }
        for ((first, second), count) in counts {
            if count > 1 {
                duplicates.push(DuplicateKey {
                    table: spec.table.wire_name(),
                    key: format!("({first}, {second})"),
                    rows: count,
                });
            }
        }
    }
    duplicates
}

fn ids_of(set: &RecordSet, kind: TableKind, field: &str) -> Vec<String> {
    set.table(kind)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| row.text(field))
        .map(str::to_owned)
        .collect()
}
