#![allow(deprecated)]
use assert_cmd::Command;
use chrono::{NaiveDate, TimeZone, Utc};
use igams_core::sqlite::SqliteLogStore;
use igams_core::types::{ExecutionRecord, ExecutionStatus};
use predicates::prelude::*;
use tempfile::TempDir;

fn igams(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("igams").unwrap();
    cmd.current_dir(dir.path())
        .env("IGAMS_CONFIG", dir.path().join("igams.yaml"))
        .env("IGAMS_DB", dir.path().join("logs.db"))
        .env("IGAMS_ACTOR", "alice")
        .env_remove("RUST_LOG");
    cmd
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn seed(dir: &TempDir, records: &[ExecutionRecord]) {
    let store = SqliteLogStore::open(&dir.path().join("logs.db")).unwrap();
    for r in records {
        store.insert_record(r).unwrap();
    }
}

fn rec(id: &str, status: ExecutionStatus, quality: Option<f64>) -> ExecutionRecord {
    let mut r = ExecutionRecord::new(id, format!("step-{id}"), "alice", day(), status);
    r.quality_score = quality;
    r
}

fn long_step(id: &str) -> ExecutionRecord {
    let mut r = rec(id, ExecutionStatus::Completed, Some(0.9));
    r.planned_start = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    r.actual_start = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    r.actual_end = Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 30, 0).unwrap());
    r
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ---------------------------------------------------------------------------
// igams db / config
// ---------------------------------------------------------------------------

#[test]
fn db_init_creates_database() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .args(["db", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Log store ready"));
    assert!(dir.path().join("logs.db").exists());
}

#[test]
fn config_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    let content = std::fs::read_to_string(dir.path().join("igams.yaml")).unwrap();
    assert!(content.contains("low_quality_score: 0.6"));

    igams(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn config_validate_passes_on_defaults() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_fails_on_out_of_range_threshold() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("igams.yaml"),
        "thresholds:\n  low_quality_score: 1.5\n",
    )
    .unwrap();
    igams(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("low_quality_score"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_show_json_reflects_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("igams.yaml"),
        "analysis:\n  max_range_days: 31\n",
    )
    .unwrap();
    let v = json_of(igams(&dir).args(["config", "show", "--json"]));
    assert_eq!(v["analysis"]["max_range_days"], 31);
    assert_eq!(v["thresholds"]["overrun_minutes"], 120.0);
}

// ---------------------------------------------------------------------------
// igams metrics / issues / suggest / inspect
// ---------------------------------------------------------------------------

#[test]
fn metrics_json_for_healthy_day() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        &[
            rec("r1", ExecutionStatus::Completed, Some(0.9)),
            rec("r2", ExecutionStatus::Completed, Some(0.8)),
        ],
    );
    let v = json_of(igams(&dir).args(["metrics", "--date", "2026-03-02", "--json"]));
    assert_eq!(v["actor_id"], "alice");
    assert_eq!(v["metrics"]["execution_accuracy"], 1.0);
    assert_eq!(v["metrics"]["time_deviation"], 1.0);
}

#[test]
fn metrics_table_output() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[long_step("r1")]);
    igams(&dir)
        .args(["metrics", "--date", "2026-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("time_deviation"))
        .stdout(predicate::str::contains("250.0%"));
}

#[test]
fn missing_actor_fails() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .env_remove("IGAMS_ACTOR")
        .args(["metrics", "--date", "2026-03-02"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no actor given"));
}

#[test]
fn issues_lists_skip_and_low_quality() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        &[
            rec("r1", ExecutionStatus::Skipped, None),
            rec("r2", ExecutionStatus::Completed, Some(0.4)),
        ],
    );
    let v = json_of(igams(&dir).args(["issues", "--date", "2026-03-02", "--json"]));
    assert_eq!(v["count"], 2);
    assert_eq!(v["issues"][0]["type"], "skipped");
    assert_eq!(v["issues"][1]["type"], "low_quality");
}

#[test]
fn suggest_prints_split_for_long_step() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[long_step("r1")]);
    igams(&dir)
        .args(["suggest", "--date", "2026-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[split] Reduce Step Complexity"))
        .stdout(predicate::str::contains("Time deviation: 250.0%"));
}

#[test]
fn suggest_on_empty_day_is_quiet() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .args(["suggest", "--date", "2026-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No suggestions"));
}

#[test]
fn inspect_json_counts_errors() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        &[rec("r1", ExecutionStatus::Skipped, None), long_step("r2")],
    );
    let v = json_of(igams(&dir).args(["inspect", "--date", "2026-03-02", "--json"]));
    assert_eq!(v["findings"].as_array().unwrap().len(), 2);
    assert_eq!(v["errors_detected"].as_array().unwrap().len(), 1);
}

#[test]
fn malformed_record_fails_the_day() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[rec("r1", ExecutionStatus::Completed, Some(1.4))]);
    igams(&dir)
        .args(["metrics", "--date", "2026-03-02"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed execution record 'r1'"));
}

// ---------------------------------------------------------------------------
// igams analyze / range
// ---------------------------------------------------------------------------

#[test]
fn analyze_with_disabled_advisory_reports_unavailable() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[long_step("r1")]);
    let v = json_of(igams(&dir).args(["analyze", "--date", "2026-03-02", "--advisory", "--json"]));
    assert_eq!(v["suggestions"].as_array().unwrap().len(), 1);
    assert_eq!(v["advisory"]["status"], "unavailable");
    assert_eq!(v["advisory"]["reason"], "advisory service is disabled");
}

#[test]
fn analyze_without_advisory_omits_field() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[long_step("r1")]);
    let v = json_of(igams(&dir).args(["analyze", "--date", "2026-03-02", "--json"]));
    assert!(v.get("advisory").is_none());
    assert_eq!(v["signals"][0], "time_overrun_ratio");
}

#[test]
fn range_json_has_one_entry_per_day() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &[rec("r1", ExecutionStatus::Completed, Some(0.9))]);
    let v = json_of(igams(&dir).args([
        "range",
        "--start",
        "2026-03-01",
        "--end",
        "2026-03-04",
        "--json",
    ]));
    let days = v.as_array().unwrap();
    assert_eq!(days.len(), 4);
    assert_eq!(days[1]["date"], "2026-03-02");
    assert_eq!(days[1]["metrics"]["total_steps"], 1);
}

#[test]
fn reversed_range_fails() {
    let dir = TempDir::new().unwrap();
    igams(&dir)
        .args(["range", "--start", "2026-03-04", "--end", "2026-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("start is after end"));
}
