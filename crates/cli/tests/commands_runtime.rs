use std::fs;
use std::path::PathBuf;

use amendex_cli::commands::{apply, check, inspect};
use serde_json::{json, Value};

fn write_fixture(dir: &tempfile::TempDir, name: &str, value: Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn base_fixture() -> Value {
    json!({
        "Amendment Logs": [{"FileName": "contract.pdf", "Note": "Initial"}],
        "output_records": [
            {"name": "Contract", "data": [
                {"ContractExternalId": "C-100", "AccountName": "Acme", "PaymentTerms": "Net 30"}
            ]},
            {"name": "Subscription", "data": [
                {"ContractExternalId": "C-100", "ProductName": "Plan Pro",
                 "subExternalId": "sub1_C"}
            ]},
            {"name": "LineItemSource", "data": [
                {"lisExternalId": "lis1_sub1_C", "subExternalId": "sub1_C"}
            ]}
        ]
    })
}

fn delta_fixture() -> Value {
    json!({
        "Contractid": "C-100",
        "Amendment Logs": [{"FileName": "amendment_1.docx", "Note": "Amended"}],
        "output_records": [
            {"name": "Contract", "data": [
                {"ContractExternalId": "C-100", "PaymentTerms": "Net 60"}
            ]},
            {"name": "Subscription", "data": [
                {"ContractExternalId": "C-100", "ProductName": "Plan Pro",
                 "subExternalId": "amd_sub1_C"}
            ]}
        ]
    })
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output is JSON")
}

#[test]
fn apply_writes_the_updated_record_set_and_reports_the_round() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_fixture(&dir, "base.json", base_fixture());
    let delta = write_fixture(&dir, "delta.json", delta_fixture());
    let out = dir.path().join("updated.json");

    let result = apply::run(&base, &[delta], Some(&out));
    assert_eq!(result.exit_code, 0, "apply failed: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "apply");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["rounds"][0]["contract_id"], "C-100");
    assert_eq!(payload["rounds"][0]["matched"], true);

    let updated: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let tables = updated["output_records"].as_array().unwrap();
    let subscriptions =
        tables.iter().find(|entry| entry["name"] == "Subscription").unwrap();
    assert_eq!(subscriptions["data"][0]["subExternalId"], "amd_sub1_C");
    let line_items =
        tables.iter().find(|entry| entry["name"] == "LineItemSource").unwrap();
    assert_eq!(line_items["data"][0]["subExternalId"], "amd_sub1_C");
}

#[test]
fn apply_folds_multiple_deltas_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_fixture(&dir, "base.json", base_fixture());
    let first = write_fixture(&dir, "delta1.json", delta_fixture());
    let second = write_fixture(
        &dir,
        "delta2.json",
        json!({
            "Contractid": "C-100",
            "Amendment Logs": [{"FileName": "amendment_2.docx", "Note": "Amended"}],
            "output_records": [
                {"name": "Subscription", "data": [
                    {"ContractExternalId": "C-100", "ProductName": "Plan Pro",
                     "subExternalId": "amd2_sub1_C"}
                ]}
            ]
        }),
    );
    let out = dir.path().join("updated.json");

    let result = apply::run(&base, &[first, second], Some(&out));
    assert_eq!(result.exit_code, 0, "apply failed: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["rounds"].as_array().unwrap().len(), 2);

    let updated: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let logs = updated["Amendment Logs"].as_array().unwrap();
    assert_eq!(logs.len(), 3);
}

#[test]
fn apply_fails_cleanly_on_a_missing_base_file() {
    let dir = tempfile::tempdir().unwrap();
    let delta = write_fixture(&dir, "delta.json", delta_fixture());

    let result = apply::run(&dir.path().join("missing.json"), &[delta], None);
    assert_eq!(result.exit_code, 1);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "apply_failed");
}

#[test]
fn inspect_reports_tables_and_the_latest_note() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_fixture(&dir, "base.json", base_fixture());

    let result = inspect::run(&base);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "inspect");
    assert_eq!(payload["amendment_log_entries"], 1);
    assert_eq!(payload["latest_note"], "Initial");
    assert_eq!(payload["tables"][1]["name"], "Subscription");
    assert_eq!(payload["tables"][1]["rows"], 1);
}

#[test]
fn check_passes_on_a_consistent_record_set() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_fixture(&dir, "base.json", base_fixture());

    let result = check::run(&base);
    assert_eq!(result.exit_code, 0, "check failed: {}", result.output);
    assert_eq!(parse_payload(&result.output)["status"], "ok");
}

#[test]
fn check_flags_dangling_references() {
    let dir = tempfile::tempdir().unwrap();
    let mut fixture = base_fixture();
    fixture["output_records"][2]["data"][0]["subExternalId"] = json!("sub9_C");
    let base = write_fixture(&dir, "base.json", fixture);

    let result = check::run(&base);
    assert_eq!(result.exit_code, 1);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "violations");
    assert_eq!(payload["dangling_references"][0]["table"], "LineItemSource");
    assert_eq!(payload["dangling_references"][0]["value"], "sub9_C");
    assert_eq!(payload["dangling_references"][0]["class"], "missing_owner");
}

#[test]
fn check_flags_references_left_behind_by_a_rename() {
    let dir = tempfile::tempdir().unwrap();
    let mut fixture = base_fixture();
    // The subscription was renamed but the child row still holds the old id.
    fixture["output_records"][1]["data"][0]["subExternalId"] = json!("amd_sub1_C");
    let base = write_fixture(&dir, "base.json", fixture);

    let result = check::run(&base);
    assert_eq!(result.exit_code, 1);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "violations");
    assert_eq!(payload["dangling_references"][0]["table"], "LineItemSource");
    assert_eq!(payload["dangling_references"][0]["value"], "sub1_C");
    assert_eq!(payload["dangling_references"][0]["class"], "stale_prefix");
}
