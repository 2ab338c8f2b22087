use tracing::info;

use crate::record::RecordSet;
use crate::tables::fields;

/// Net changes accumulated over one round, rendered into a single
/// human-readable note on the newest amendment log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub contract_changes: Vec<String>,
    pub subscriptions_added: Vec<String>,
    pub subscriptions_updated: Vec<String>,
    pub line_item_changes: Vec<String>,
    pub discount_changes: Vec<String>,
}

impl ChangeSummary {
    /// `"<Category>: <items or 'None'>"` per category, joined with `" | "`.
    pub fn compose(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        parts.push(category("Contract Changes", &self.contract_changes));

        let mut subscription_parts = Vec::new();
        if !self.subscriptions_added.is_empty() {
            subscription_parts.push(format!("Added: {}", self.subscriptions_added.join(", ")));
        }
        if !self.subscriptions_updated.is_empty() {
            subscription_parts.push(format!("Updated: {}", self.subscriptions_updated.join(", ")));
        }
        parts.push(if subscription_parts.is_empty() {
            "Subscription Changes: None".to_owned()
        } else {
            format!("Subscription Changes: {}", subscription_parts.join("; "))
        });

        parts.push(category("Line Item Source Changes", &self.line_item_changes));
        parts.push(category("Discount Schedule Changes", &self.discount_changes));
        parts.join(" | ")
    }
}

fn category(label: &str, items: &[String]) -> String {
    if items.is_empty() {
        format!("{label}: None")
    } else {
        format!("{label}: {}", items.join(", "))
    }
}

/// Write the composed note into the most recently appended amendment log
/// entry. Without any log entry there is nothing to annotate.
pub fn annotate_latest(summary: &ChangeSummary, set: &mut RecordSet) {
    let Some(latest) = set.amendment_logs.last_mut() else {
        return;
    };
    let note = summary.compose();
    info!(%note, "amendment note composed");
    latest.set_text(fields::NOTE, &note);
}
