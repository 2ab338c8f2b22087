use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use amendex_core::{reconcile, RecordSet};

use crate::commands::{load_record_set, CommandResult};

#[derive(Debug, Serialize)]
struct RoundReport {
    delta_file: String,
    contract_id: Option<String>,
    matched: bool,
    note: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApplyReport {
    command: &'static str,
    status: &'static str,
    base_file: String,
    output_file: String,
    applied_at: DateTime<Utc>,
    rounds: Vec<RoundReport>,
}

/// Rounds for one base set must be applied strictly sequentially; this
/// command is that ordering guarantee. Each round's output is the next
/// round's input, and nothing is written until every round has completed.
pub fn run(base_path: &Path, delta_paths: &[PathBuf], out: Option<&Path>) -> CommandResult {
    match apply_rounds(base_path, delta_paths, out) {
        Ok(report) => CommandResult::report(report),
        Err(error) => CommandResult::failure("apply", "apply_failed", format!("{error:#}")),
    }
}

fn apply_rounds(
    base_path: &Path,
    delta_paths: &[PathBuf],
    out: Option<&Path>,
) -> anyhow::Result<ApplyReport> {
    let mut current = load_record_set(base_path)?;
    let mut rounds = Vec::with_capacity(delta_paths.len());

    for delta_path in delta_paths {
        let delta = load_record_set(delta_path)?;
        let contract_id = delta.contract_id.clone();
        info!(delta = %delta_path.display(), contract_id, "applying amendment round");

        current = reconcile(current, &delta)
            .with_context(|| format!("reconciling {}", delta_path.display()))?;

        rounds.push(RoundReport {
            delta_file: delta_path.display().to_string(),
            matched: contract_id.is_some(),
            contract_id,
            note: latest_note(&current),
        });
    }

    let output_file = out.map(Path::to_path_buf).unwrap_or_else(|| default_output(base_path));
    let serialized = serde_json::to_string_pretty(&current)?;
    std::fs::write(&output_file, serialized)
        .with_context(|| format!("writing {}", output_file.display()))?;

    Ok(ApplyReport {
        command: "apply",
        status: "ok",
        base_file: base_path.display().to_string(),
        output_file: output_file.display().to_string(),
        applied_at: Utc::now(),
        rounds,
    })
}

fn latest_note(set: &RecordSet) -> Option<String> {
    set.amendment_logs.last().and_then(|entry| entry.text("Note")).map(str::to_owned)
}

fn default_output(base_path: &Path) -> PathBuf {
    let stem = base_path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("record_set");
    base_path.with_file_name(format!("{stem}_updated.json"))
}
