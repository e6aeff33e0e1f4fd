//! Drive the `passboard` binary against a temp base directory.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BATCH: &str = r#"[{"name":"Dam","secret":"4821","effective_date":"2025-03-02"},{"name":"N/A","secret":"-","effective_date":"-"}]"#;

fn passboard(base: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("passboard"));
    cmd.arg("--base-dir").arg(base);
    cmd
}

fn write_scrape(base: &Path, body: &str) {
    fs::write(base.join("scrape.sh"), body).unwrap();
}

/// `init` plus a scrape script that prints `BATCH`.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_scrape(dir.path(), &format!("echo '{BATCH}'\n"));
    passboard(dir.path())
        .args(["init", "--command", "sh scrape.sh", "--page"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passboard.yaml"));
    dir
}

#[test]
fn init_writes_config_output_dir_and_page_once() {
    let dir = initialized();
    assert!(dir.path().join("passboard.yaml").is_file());
    assert!(dir.path().join("output").is_dir());
    let page = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(page.contains("<section class=\"list\">"));

    passboard(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    let config = fs::read_to_string(dir.path().join("passboard.yaml")).unwrap();
    assert!(config.contains("sh scrape.sh"));
}

#[test]
fn run_publishes_then_reports_nothing_to_do() {
    let dir = initialized();

    passboard(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("published 1 record(s)"))
        .stdout(predicate::str::contains("+ Dam"));

    let page = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(page.contains("<div class=\"pass\">4821</div>"));
    assert!(!page.contains("N/A"));
    let store_bytes = fs::read(dir.path().join("output/records.json")).unwrap();

    passboard(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stdout(predicate::str::contains("no changes").or(predicate::str::contains("stale")));
    assert_eq!(fs::read(dir.path().join("output/records.json")).unwrap(), store_bytes);
}

#[test]
fn dry_run_leaves_store_and_page_alone() {
    let dir = initialized();
    let page = fs::read_to_string(dir.path().join("index.html")).unwrap();

    passboard(dir.path())
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[dry-run]"))
        .stdout(predicate::str::contains("would publish"));

    assert!(!dir.path().join("output/records.json").exists());
    assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), page);
}

#[test]
fn continuous_run_gives_up_after_max_attempts() {
    let dir = initialized();
    write_scrape(dir.path(), "echo 'login page did not load' >&2\nexit 3\n");

    passboard(dir.path())
        .args(["run", "--continuous", "--max-attempts", "2", "--interval", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("exhausted after 2 attempt(s), 1 sleep(s)"));
}

#[test]
fn interval_requires_continuous() {
    let dir = initialized();
    passboard(dir.path())
        .args(["run", "--interval", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--continuous"));
}

#[test]
fn status_json_reports_records_and_drift() {
    let dir = initialized();

    let before = passboard(dir.path()).args(["status", "--json"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&before.get_output().stdout).unwrap();
    assert_eq!(json["drift"], "never_published");
    assert_eq!(json["records"].as_array().unwrap().len(), 0);

    passboard(dir.path()).arg("run").assert().success();

    let after = passboard(dir.path()).args(["status", "--json"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&after.get_output().stdout).unwrap();
    assert_eq!(json["drift"], "current");
    assert_eq!(json["records"][0]["name"], "Dam");
    assert!(json["snapshot_at"].is_string());
}

#[test]
fn status_table_lists_records() {
    let dir = initialized();
    passboard(dir.path()).arg("run").assert().success();

    passboard(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"))
        .stdout(predicate::str::contains("CURRENT"))
        .stdout(predicate::str::contains("Dam"))
        .stdout(predicate::str::contains("4821"));
}

#[test]
fn diff_shows_hand_edits_to_the_listing() {
    let dir = initialized();
    passboard(dir.path()).arg("run").assert().success();

    passboard(dir.path())
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences"));

    let page_path = dir.path().join("index.html");
    let edited = fs::read_to_string(&page_path).unwrap().replace(">4821<", ">0000<");
    fs::write(&page_path, edited).unwrap();

    passboard(dir.path())
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- a/index.html"))
        .stdout(predicate::str::contains("+++ b/index.html"))
        .stdout(predicate::str::contains("+      <div class=\"pass\">4821</div>"));
}

#[test]
fn run_without_extract_command_fails_with_a_hint() {
    let dir = TempDir::new().unwrap();
    passboard(dir.path())
        .args(["init", "--page"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set extract_command"));

    passboard(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("extract_command"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("passboard.yaml"), "extract_comand: sh scrape.sh\n").unwrap();

    passboard(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passboard.yaml"));
}
