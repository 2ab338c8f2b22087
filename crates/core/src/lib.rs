pub mod cascade;
pub mod crossref;
pub mod dedup;
pub mod engine;
pub mod errors;
pub mod merge;
pub mod record;
pub mod related;
pub mod resolver;
pub mod round;
pub mod subscription;
pub mod summary;
pub mod tables;
pub mod value;

pub use engine::{reconcile, reconcile_with_contract};
pub use errors::ReconcileError;
pub use merge::{merge_fields, FieldChange};
pub use record::{FieldName, Record, RecordSet, TableEntry};
pub use resolver::{resolve_match, same_identifier, strip_amended_prefix, AMENDED_PREFIX};
pub use round::{RenameMap, RoundContext};
pub use summary::ChangeSummary;
pub use tables::{DedupSpec, Owner, TableKind, TableSpec, DEDUP_SPECS};
pub use value::Scalar;
