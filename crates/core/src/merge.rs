use std::fmt;

use tracing::debug;

use crate::record::{FieldName, Record};
use crate::value::Scalar;

/// One applied field overwrite, rendered as `field: old → new` in the
/// amendment note.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldChange {
    pub field: FieldName,
    pub previous: Option<Scalar>,
    pub updated: Scalar,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let previous = self.previous.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(f, "{}: {} → {}", self.field, previous, self.updated)
    }
}

/// Field-by-field overwrite of `existing` from `incoming`.
///
/// Protected fields are never touched; absent (sentinel) incoming values never
/// overwrite a known value; equal values are a no-op. Fields not present in
/// `incoming` are left alone, so this is a pure overwrite, not a structural
/// merge.
pub fn merge_fields(
    existing: &mut Record,
    incoming: &Record,
    protected: &[&str],
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (field, value) in &incoming.0 {
        if protected.contains(&field.as_str()) {
            debug!(field, "protected field ignored, keeping original");
            continue;
        }
        let Some(value) = value.known() else {
            debug!(field, "incoming value is absent, keeping original");
            continue;
        };
        if existing.get(field) == Some(value) {
            continue;
        }
        let change = FieldChange {
            field: field.clone(),
            previous: existing.get(field).cloned(),
            updated: value.clone(),
        };
        debug!(field, change = %change, "field overwritten");
        existing.set(field.clone(), value.clone());
        changes.push(change);
    }

    changes
}
