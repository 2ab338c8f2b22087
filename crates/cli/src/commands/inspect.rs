use std::path::Path;

use serde::Serialize;

use crate::commands::{load_record_set, CommandResult};

#[derive(Debug, Serialize)]
struct TableSummary {
    name: String,
    rows: usize,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    command: &'static str,
    status: &'static str,
    file: String,
    tables: Vec<TableSummary>,
    amendment_log_entries: usize,
    latest_note: Option<String>,
}

pub fn run(path: &Path) -> CommandResult {
    let set = match load_record_set(path) {
        Ok(set) => set,
        Err(error) => {
            return CommandResult::failure("inspect", "load_failed", format!("{error:#}"))
        }
    };

    CommandResult::report(InspectReport {
        command: "inspect",
        status: "ok",
        file: path.display().to_string(),
        tables: set
            .tables()
            .iter()
            .map(|entry| TableSummary { name: entry.name.clone(), rows: entry.data.len() })
            .collect(),
        amendment_log_entries: set.amendment_logs.len(),
        latest_note: set
            .amendment_logs
            .last()
            .and_then(|entry| entry.text("Note"))
            .map(str::to_owned),
    })
}
