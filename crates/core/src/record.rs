use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tables::TableKind;
use crate::value::Scalar;

pub type FieldName = String;

/// One flat row: field name to scalar value. Relationships between rows are
/// expressed purely through identifier fields, never through nesting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub BTreeMap<FieldName, Scalar>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.0.get(field)
    }

    /// Known (non-sentinel) string value of a field. Identifier and name
    /// lookups go through here so "NA" ids never participate in matching.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Scalar::known).and_then(Scalar::as_text)
    }

    /// Raw display form of a field, sentinel spellings included. Used where
    /// the original bytes matter, e.g. dedup grouping keys.
    pub fn raw(&self, field: &str) -> String {
        self.0.get(field).map(ToString::to_string).unwrap_or_default()
    }

    pub fn set(&mut self, field: impl Into<FieldName>, value: Scalar) {
        self.0.insert(field.into(), value);
    }

    pub fn set_text(&mut self, field: impl Into<FieldName>, value: &str) {
        self.set(field, Scalar::from(value));
    }
}

impl FromIterator<(FieldName, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (FieldName, Scalar)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

/// One named table inside `output_records`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    #[serde(default)]
    pub data: Vec<Record>,
}

/// The wire shape shared by the base set and each amendment delta:
/// an optional contract identifier (delta only), the append-only audit log,
/// and the named tables. A missing `output_records` key and a present but
/// empty one are distinct cases, so presence is kept through the `Option`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(rename = "Contractid", default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    #[serde(rename = "Amendment Logs", default)]
    pub amendment_logs: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_records: Option<Vec<TableEntry>>,
}

impl RecordSet {
    pub fn tables(&self) -> &[TableEntry] {
        self.output_records.as_deref().unwrap_or_default()
    }

    pub fn table(&self, kind: TableKind) -> Option<&[Record]> {
        self.tables()
            .iter()
            .find(|entry| entry.name == kind.wire_name())
            .map(|entry| entry.data.as_slice())
    }

    /// Mutable rows of a known table, creating an empty entry at the end of
    /// `output_records` when the table is not present yet.
    pub fn table_mut(&mut self, kind: TableKind) -> &mut Vec<Record> {
        self.entry_mut(kind.wire_name())
    }

    /// Mutable rows of a table only when it already exists; never creates.
    pub fn existing_table_mut(&mut self, kind: TableKind) -> Option<&mut Vec<Record>> {
        self.output_records
            .as_mut()?
            .iter_mut()
            .find(|entry| entry.name == kind.wire_name())
            .map(|entry| &mut entry.data)
    }

    pub fn entry_mut(&mut self, name: &str) -> &mut Vec<Record> {
        let entries = self.output_records.get_or_insert_with(Vec::new);
        if let Some(position) = entries.iter().position(|entry| entry.name == name) {
            return &mut entries[position].data;
        }
        let index = entries.len();
        entries.push(TableEntry { name: name.to_owned(), data: Vec::new() });
        &mut entries[index].data
    }
}
