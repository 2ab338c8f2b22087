use serde::{Deserialize, Serialize};

/// Field names shared across tables.
pub mod fields {
    pub const CONTRACT_EXTERNAL_ID: &str = "ContractExternalId";
    pub const SUB_EXTERNAL_ID: &str = "subExternalId";
    pub const DISC_EXT_ID: &str = "DiscExtId";
    pub const PRODUCT_NAME: &str = "ProductName";
    pub const ACCOUNT_NAME: &str = "AccountName";
    pub const NOTE: &str = "Note";
}

/// How rows of a table are tied to their owning entity, which decides
/// eligibility during a reconciliation round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// Top-level rows (Contract, Subscription) are matched by their own keys.
    None,
    /// Rows referencing a subscription; eligible only when the owning
    /// `subExternalId` was touched this round.
    Subscription,
    /// Discount schedules carry their own identifier and may be amended
    /// without any subscription change.
    Independent,
}

/// Declarative per-table matching configuration. Adding a table is a data
/// change here, not a new branch in the merge code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub wire_name: &'static str,
    /// Field holding the row's own round-generated external identifier.
    pub id_field: Option<&'static str>,
    /// Secondary match keys, scanned in order to break identifier ties.
    pub name_fields: &'static [&'static str],
    pub owner: Owner,
}

/// Tables the engine knows how to match. Any other table name arriving in a
/// delta is appended verbatim and never participates in matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Contract,
    Subscription,
    LineItemSource,
    SubConsumptionSchedule,
    SubConsumptionRate,
    LisConsumptionSchedule,
    LisConsumptionRate,
    DiscountSchedule,
    DiscountRate,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::Contract,
        TableKind::Subscription,
        TableKind::LineItemSource,
        TableKind::SubConsumptionSchedule,
        TableKind::SubConsumptionRate,
        TableKind::LisConsumptionSchedule,
        TableKind::LisConsumptionRate,
        TableKind::DiscountSchedule,
        TableKind::DiscountRate,
    ];

    pub fn parse(name: &str) -> Option<TableKind> {
        TableKind::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }

    pub fn wire_name(self) -> &'static str {
        self.spec().wire_name
    }

    pub fn spec(self) -> &'static TableSpec {
        match self {
            TableKind::Contract => &TableSpec {
                wire_name: "Contract",
                id_field: Some(fields::CONTRACT_EXTERNAL_ID),
                name_fields: &[],
                owner: Owner::None,
            },
            TableKind::Subscription => &TableSpec {
                wire_name: "Subscription",
                id_field: Some(fields::SUB_EXTERNAL_ID),
                name_fields: &[],
                owner: Owner::None,
            },
            TableKind::LineItemSource => &TableSpec {
                wire_name: "LineItemSource",
                id_field: Some("lisExternalId"),
                name_fields: &["lisName"],
                owner: Owner::Subscription,
            },
            TableKind::SubConsumptionSchedule => &TableSpec {
                wire_name: "subConsumptionSchedule",
                id_field: Some("subCsExternalId"),
                name_fields: &["scheduleName", "name"],
                owner: Owner::Subscription,
            },
            TableKind::SubConsumptionRate => &TableSpec {
                wire_name: "subConsumptionRate",
                id_field: Some("subCrExternalId"),
                name_fields: &["rateName", "name"],
                owner: Owner::Subscription,
            },
            TableKind::LisConsumptionSchedule => &TableSpec {
                wire_name: "lisConsumptionSchedule",
                id_field: Some("scsExternalId"),
                name_fields: &["scheduleName", "name"],
                owner: Owner::Subscription,
            },
            TableKind::LisConsumptionRate => &TableSpec {
                wire_name: "lisConsumptionRate",
                id_field: Some("scrExternalId"),
                name_fields: &["rateName", "name"],
                owner: Owner::Subscription,
            },
            TableKind::DiscountSchedule => &TableSpec {
                wire_name: "discountSchedule",
                id_field: Some(fields::DISC_EXT_ID),
                name_fields: &[],
                owner: Owner::Independent,
            },
            TableKind::DiscountRate => &TableSpec {
                wire_name: "discountRate",
                id_field: None,
                name_fields: &[],
                owner: Owner::Subscription,
            },
        }
    }

    /// Tables whose rows reference a subscription through `subExternalId`;
    /// the rename cascade rewrites exactly these.
    pub fn sub_referencing() -> impl Iterator<Item = TableKind> {
        [
            TableKind::LineItemSource,
            TableKind::SubConsumptionSchedule,
            TableKind::SubConsumptionRate,
            TableKind::LisConsumptionSchedule,
            TableKind::LisConsumptionRate,
            TableKind::DiscountSchedule,
            TableKind::DiscountRate,
        ]
        .into_iter()
    }
}

/// Composite-key configuration for the end-of-round deduplication pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DedupSpec {
    pub table: TableKind,
    pub key: (&'static str, &'static str),
    pub id_field: &'static str,
}

pub const DEDUP_SPECS: [DedupSpec; 4] = [
    DedupSpec {
        table: TableKind::SubConsumptionSchedule,
        key: (fields::SUB_EXTERNAL_ID, "subCsName"),
        id_field: "subCsExternalId",
    },
    DedupSpec {
        table: TableKind::LisConsumptionSchedule,
        key: ("lisExternalId", "scsName"),
        id_field: "scsExternalId",
    },
    DedupSpec {
        table: TableKind::SubConsumptionRate,
        key: (fields::SUB_EXTERNAL_ID, "subCrName"),
        id_field: "subCrExternalId",
    },
    DedupSpec {
        table: TableKind::LisConsumptionRate,
        key: (fields::SUB_EXTERNAL_ID, "scrName"),
        id_field: "scrExternalId",
    },
];
