//! CLI integration tests for the `chaosboard` subcommands.
//!
//! Every test runs the binary inside a fresh temp directory with a config
//! file that pins the seed, the corpus size and "now", so listings are
//! reproducible.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[corpus]
seed = 7
runs = 12
scenarios = 8
incidents = 10
anchor = "2026-01-20T14:00:00Z"
"#;

/// Temp dir holding `chaosboard.toml`.
fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("chaosboard.toml"), CONFIG).expect("write config");
    dir
}

fn chaosboard(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("chaosboard");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("CHAOSBOARD_API_KEY");
    cmd.env_remove("CHAOSBOARD_RATE_LIMIT");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run chaosboard");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = workspace();
    chaosboard(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chaos experiment dashboard"));
}

#[test]
fn version_exits_0() {
    let dir = workspace();
    chaosboard(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chaosboard"));
}

// ──────────────────────────────────────────────
// 2. Runs
// ──────────────────────────────────────────────

#[test]
fn runs_json_is_first_page() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args(["runs", "--output", "json"]));
    assert_eq!(page["page"], 1);
    assert_eq!(page["pageSize"], 10);
    assert_eq!(page["totalCount"], 12);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
}

#[test]
fn runs_page_past_end_is_clamped() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args(["runs", "--page", "9", "--output", "json"]));
    assert_eq!(page["page"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
}

#[test]
fn runs_status_filter_narrows() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args(["runs", "--status", "failed", "--output", "json"]));
    for run in page["items"].as_array().unwrap() {
        assert_eq!(run["status"], "failed");
    }
    let all = json_stdout(chaosboard(&dir).args(["runs", "--status", "all", "--output", "json"]));
    assert_eq!(all["totalCount"], 12);
}

#[test]
fn runs_text_has_footer() {
    let dir = workspace();
    chaosboard(&dir)
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("page 1 of 2 (12 runs)"));
}

#[test]
fn runs_bad_status_fails() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["runs", "--status", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn runs_bad_date_fails() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["runs", "--from", "last tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timestamp"));
}

#[test]
fn run_detail_shows_timeline() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["run", "run-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("run-0001"))
        .stdout(predicate::str::contains("timeline:"));
}

#[test]
fn unknown_run_exits_1() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["run", "run-9999"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("run not found: run-9999"));
}

#[test]
fn unknown_run_json_error() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["run", "run-9999", "--output", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            r#"{"error":"run not found: run-9999"}"#,
        ));
}

#[test]
fn quiet_suppresses_error_message() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["run", "run-9999", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. Reproducibility
// ──────────────────────────────────────────────

#[test]
fn same_seed_same_output() {
    let dir = workspace();
    let first = chaosboard(&dir).args(["runs", "--output", "json"]).output().unwrap();
    let second = chaosboard(&dir).args(["runs", "--output", "json"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn seed_flag_overrides_config() {
    let dir = workspace();
    let configured = chaosboard(&dir).args(["runs", "--output", "json"]).output().unwrap();
    let flagged = chaosboard(&dir)
        .args(["runs", "--output", "json", "--seed", "8"])
        .output()
        .unwrap();
    assert!(flagged.status.success());
    assert_ne!(configured.stdout, flagged.stdout);
}

#[test]
fn explicit_config_path() {
    let dir = workspace();
    let other = TempDir::new().unwrap();
    let path = other.path().join("small.toml");
    fs::write(&path, "[corpus]\nruns = 3\nanchor = \"2026-01-20T14:00:00Z\"\n").unwrap();
    let page = json_stdout(chaosboard(&dir).args([
        "runs",
        "--output",
        "json",
        "--config",
        path.to_str().unwrap(),
    ]));
    assert_eq!(page["totalCount"], 3);
}

#[test]
fn invalid_config_is_reported() {
    let dir = workspace();
    fs::write(dir.path().join("chaosboard.toml"), "[corpus]\nsede = 1\n").unwrap();
    chaosboard(&dir)
        .arg("kpis")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error parsing config"));
}

#[test]
fn page_size_from_config() {
    let dir = workspace();
    fs::write(
        dir.path().join("chaosboard.toml"),
        format!("{CONFIG}\n[query]\npage_size = 5\n"),
    )
    .unwrap();
    let page = json_stdout(chaosboard(&dir).args(["runs", "--output", "json"]));
    assert_eq!(page["pageSize"], 5);
    assert_eq!(page["totalPages"], 3);
}

// ──────────────────────────────────────────────
// 4. Scenarios
// ──────────────────────────────────────────────

#[test]
fn scenarios_archived_filter() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args([
        "scenarios",
        "--status",
        "archived",
        "--output",
        "json",
    ]));
    let items = page["items"].as_array().unwrap();
    assert!(items.iter().any(|s| s["id"] == "scenario-001"));
    assert!(items.iter().all(|s| s["status"] == "archived"));
}

#[test]
fn scenarios_type_all_is_unfiltered() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args(["scenarios", "--type", "all", "--output", "json"]));
    assert_eq!(page["totalCount"], 8);
}

#[test]
fn versions_have_one_current() {
    let dir = workspace();
    let versions = json_stdout(chaosboard(&dir).args(["versions", "scenario-002", "--output", "json"]));
    let versions = versions.as_array().unwrap();
    assert!(!versions.is_empty());
    let current = versions.iter().filter(|v| v["isCurrent"] == true).count();
    assert_eq!(current, 1);
}

#[test]
fn versions_unknown_scenario() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["versions", "scenario-999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scenario not found: scenario-999"));
}

// ──────────────────────────────────────────────
// 5. Incidents
// ──────────────────────────────────────────────

#[test]
fn incidents_open_filter() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args([
        "incidents",
        "--status",
        "open",
        "--output",
        "json",
    ]));
    let items = page["items"].as_array().unwrap();
    assert!(items.iter().any(|i| i["id"] == "inc-0001"));
    for incident in items {
        assert_eq!(incident["status"], "open");
        assert!(incident.get("owner").is_none_or(Value::is_null));
    }
}

#[test]
fn incidents_search_is_case_insensitive() {
    let dir = workspace();
    let page = json_stdout(chaosboard(&dir).args(["incidents", "--search", "INC-0001", "--output", "json"]));
    let items = page["items"].as_array().unwrap();
    assert!(items.iter().any(|i| i["id"] == "inc-0001"));
}

#[test]
fn incidents_help_lists_search_fields() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["incidents", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("service or run id"));
}

#[test]
fn incident_detail_text() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["incident", "inc-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inc-0001"))
        .stdout(predicate::str::contains("unassigned"))
        .stdout(predicate::str::contains("recommended:"));
}

// ──────────────────────────────────────────────
// 6. Export and KPIs
// ──────────────────────────────────────────────

#[test]
fn export_run_to_stdout() {
    let dir = workspace();
    let doc = json_stdout(chaosboard(&dir).args(["export", "run", "run-0001"]));
    assert_eq!(doc["id"], "run-0001");
    assert!(doc["detailedTimeline"].is_array());
}

#[test]
fn export_incident_to_file() {
    let dir = workspace();
    let out = dir.path().join("inc.json");
    chaosboard(&dir)
        .args(["export", "incident", "inc-0002", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("etag"));
    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["id"], "inc-0002");
}

#[test]
fn export_unknown_incident() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["export", "incident", "inc-9999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incident not found: inc-9999"));
}

#[test]
fn kpis_json_fields() {
    let dir = workspace();
    let kpis = json_stdout(chaosboard(&dir).args(["kpis", "--output", "json"]));
    assert!(kpis["runsToday"].is_u64());
    assert!(kpis["failedRuns"].is_u64());
    assert!(kpis["avgLatency"].is_number());
    assert!(kpis["errorBudgetBurn"].is_number());
}

#[test]
fn serve_rejects_half_tls_config() {
    let dir = workspace();
    chaosboard(&dir)
        .args(["serve", "--tls-cert", "cert.pem"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tls-cert and --tls-key"));
}
