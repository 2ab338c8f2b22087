use thiserror::Error;

/// The only fatal failure a reconciliation round can produce. Everything else
/// (unkeyable rows, resolver ambiguity, missing tables) is handled locally
/// and the round continues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Two subscription renames in the same round collide, either on the same
    /// old identifier or as a chain where one rename's new identifier is
    /// another's old identifier. The cascade outcome would depend on sweep
    /// order, so the round is rejected instead.
    #[error(
        "subscription rename {old_id} -> {new_id} conflicts with recorded rename {existing_old} -> {existing_new}"
    )]
    RenameConflict { old_id: String, new_id: String, existing_old: String, existing_new: String },
}
