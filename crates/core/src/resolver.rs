use tracing::debug;

use crate::record::Record;

/// Prefix carried by identifiers issued during an amendment round.
pub const AMENDED_PREFIX: &str = "amd_";

pub fn is_amended(id: &str) -> bool {
    id.starts_with(AMENDED_PREFIX)
}

pub fn strip_amended_prefix(id: &str) -> &str {
    id.strip_prefix(AMENDED_PREFIX).unwrap_or(id)
}

/// Identifier equivalence: equal as-is, or equal once the amended prefix is
/// stripped from either side. This is the only place that rule lives.
pub fn same_identifier(a: &str, b: &str) -> bool {
    a == b || strip_amended_prefix(a) == strip_amended_prefix(b)
}

/// Match `incoming` against `base_table` by external identifier.
///
/// Candidates are rows whose id is equivalent to the incoming id under
/// [`same_identifier`]. Ties are broken by scanning `name_fields` in order and
/// preferring the first candidate agreeing with the incoming row on that
/// field; when no name field discriminates, the first candidate in table
/// order wins (deterministic, never an error).
pub fn resolve_match(
    base_table: &[Record],
    incoming: &Record,
    id_field: &str,
    name_fields: &[&str],
) -> Option<usize> {
    let incoming_id = incoming.text(id_field)?;

    let candidates: Vec<usize> = base_table
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.text(id_field).is_some_and(|row_id| same_identifier(row_id, incoming_id))
        })
        .map(|(index, _)| index)
        .collect();

    if candidates.len() > 1 {
        debug!(incoming_id, count = candidates.len(), "identifier tie, trying name fields");
        for name_field in name_fields {
            let Some(incoming_name) = incoming.text(name_field) else { continue };
            for &index in &candidates {
                if base_table[index].text(name_field) == Some(incoming_name) {
                    return Some(index);
                }
            }
        }
    }

    candidates.first().copied()
}
