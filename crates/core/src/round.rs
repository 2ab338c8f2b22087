use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ReconcileError;
use crate::summary::ChangeSummary;

/// Old-to-new subscription identifier mappings recorded during one round.
/// Insertion rejects conflicting renames up front; by the time the
/// end-of-round sweep runs, the map is known to be consistent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenameMap {
    renames: BTreeMap<String, String>,
}

impl RenameMap {
    pub fn insert(&mut self, old_id: &str, new_id: &str) -> Result<(), ReconcileError> {
        if let Some(existing_new) = self.renames.get(old_id) {
            if existing_new == new_id {
                return Ok(());
            }
            return Err(ReconcileError::RenameConflict {
                old_id: old_id.to_owned(),
                new_id: new_id.to_owned(),
                existing_old: old_id.to_owned(),
                existing_new: existing_new.clone(),
            });
        }
        // Chains: a rename whose new id is another rename's old id (or the
        // reverse) would make the sweep outcome depend on iteration order.
        let chained = self
            .renames
            .iter()
            .find(|(existing_old, existing_new)| {
                existing_old.as_str() == new_id || existing_new.as_str() == old_id
            })
            .map(|(existing_old, existing_new)| (existing_old.clone(), existing_new.clone()));
        if let Some((existing_old, existing_new)) = chained {
            return Err(ReconcileError::RenameConflict {
                old_id: old_id.to_owned(),
                new_id: new_id.to_owned(),
                existing_old,
                existing_new,
            });
        }
        self.renames.insert(old_id.to_owned(), new_id.to_owned());
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.renames.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(old_id, new_id)| (old_id.as_str(), new_id.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Scratch state owned by one reconciliation round: created at round start,
/// threaded through every component, discarded at round end. Reusing the
/// engine across rounds can therefore never leak state between them.
#[derive(Clone, Debug, Default)]
pub struct RoundContext {
    /// `subExternalId` values touched this round (appended or matched).
    /// Child rows of untouched subscriptions stay out of this round entirely.
    pub touched_subscriptions: BTreeSet<String>,
    pub renames: RenameMap,
    pub summary: ChangeSummary,
}

impl RoundContext {
    pub fn new() -> Self {
        Self::default()
    }
}
