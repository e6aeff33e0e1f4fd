//! End-to-end cycle scenarios against a temp base directory.
//!
//! Extractors here are closures that write the snapshot slot and push its
//! mtime forward, so freshness does not depend on filesystem timestamp
//! granularity.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use passboard_core::{Config, RawRecord, Record, RecordStore, ResolvedConfig, Watermark};
use passboard_sync::{
    diff::diff_document,
    drift::{check, DriftSignal},
    pipeline::renderer_for,
    writer::tmp_path_for,
    BackupOutcome, CycleOutcome, ExtractError, Orchestrator, PublishMode,
};
use tempfile::TempDir;

const PAGE: &str = "<!DOCTYPE html>\n<html>\n<body>\n  <h1>Codes</h1>\n  <section class=\"list\">\n  </section>\n  <footer>kept</footer>\n</body>\n</html>\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(strict_baseline: bool) -> (TempDir, ResolvedConfig) {
    init_logging();
    let dir = TempDir::new().expect("tempdir");
    let config = Config {
        priority: vec!["Alpha".to_string(), "Beta".to_string()],
        strict_baseline,
        ..Config::default()
    }
    .resolve(dir.path())
    .expect("resolve");
    fs::write(&config.document, PAGE).expect("write page");
    (dir, config)
}

fn rec(name: &str, secret: &str, date: &str) -> Record {
    Record::new(name, secret, date)
}

/// Advance the snapshot slot's mtime past its previous value.
fn bump(path: &Path, previous: Watermark) {
    let now = SystemTime::now();
    let next = match previous.as_system_time() {
        Some(prev) if prev + Duration::from_secs(1) > now => prev + Duration::from_secs(1),
        _ => now,
    };
    set_file_mtime(path, FileTime::from_system_time(next)).expect("set mtime");
}

fn fresh_batch(
    store: RecordStore,
    batch: Vec<Record>,
) -> impl FnMut() -> Result<Vec<RawRecord>, ExtractError> {
    move || {
        let previous = store.watermark();
        let json = serde_json::to_string(&batch).expect("serialize batch");
        store.write_snapshot(&json)?;
        bump(store.snapshot_path(), previous);
        Ok(store.load_snapshot()?)
    }
}

fn cycle_with(config: &ResolvedConfig, batch: Vec<Record>) -> CycleOutcome {
    let extractor = fresh_batch(config.record_store(), batch);
    let renderer = renderer_for(config).expect("renderer");
    Orchestrator::new(extractor, renderer, config).cycle()
}

fn seed(config: &ResolvedConfig, records: &[Record]) {
    assert!(cycle_with(config, records.to_vec()).is_success(), "seed publish");
}

#[test]
fn new_name_is_added_and_published() {
    let (_dir, config) = setup(false);
    seed(&config, &[rec("Alpha", "111", "2024-01-01")]);
    let before = fs::read_to_string(&config.document).unwrap();

    let outcome = cycle_with(
        &config,
        vec![rec("Alpha", "111", "2024-01-01"), rec("Beta", "222", "2024-01-02")],
    );
    let report = outcome.report().expect("report").clone();
    assert!(outcome.is_success(), "got {outcome:?}");
    assert_eq!(report.added, vec!["Beta"]);
    assert!(report.updated.is_empty());
    assert_eq!(report.unchanged, vec!["Alpha"]);

    assert_eq!(
        config.record_store().load().unwrap(),
        vec![rec("Alpha", "111", "2024-01-01"), rec("Beta", "222", "2024-01-02")]
    );
    let doc = fs::read_to_string(&config.document).unwrap();
    assert!(doc.find(">Alpha<").unwrap() < doc.find(">Beta<").unwrap());
    assert!(doc.contains("<footer>kept</footer>"));
    assert_eq!(fs::read_to_string(&config.backup).unwrap(), before);
}

#[test]
fn changed_secret_is_updated() {
    let (_dir, config) = setup(false);
    seed(&config, &[rec("Alpha", "111", "2024-01-01")]);

    let outcome = cycle_with(&config, vec![rec("Alpha", "999", "2024-01-01")]);
    assert_eq!(outcome.report().unwrap().updated, vec!["Alpha"]);
    assert_eq!(
        config.record_store().load().unwrap(),
        vec![rec("Alpha", "999", "2024-01-01")]
    );
    assert!(fs::read_to_string(&config.document).unwrap().contains(">999<"));
}

#[test]
fn repeated_batch_skips_publish_and_leaves_bytes_alone() {
    let (_dir, config) = setup(false);
    let batch = vec![rec("Alpha", "111", "2024-01-01")];
    seed(&config, &batch);

    let store_bytes = fs::read(&config.store).unwrap();
    let doc_bytes = fs::read(&config.document).unwrap();
    let backup_bytes = fs::read(&config.backup).unwrap();

    let outcome = cycle_with(&config, batch);
    assert!(matches!(outcome, CycleOutcome::NoChanges { .. }), "got {outcome:?}");
    assert!(!outcome.is_success());
    assert_eq!(fs::read(&config.store).unwrap(), store_bytes);
    assert_eq!(fs::read(&config.document).unwrap(), doc_bytes);
    assert_eq!(fs::read(&config.backup).unwrap(), backup_bytes);
}

#[test]
fn placeholder_names_never_reach_store_or_page() {
    let (_dir, config) = setup(false);
    let outcome = cycle_with(
        &config,
        vec![rec("", "x", "y"), rec("N/A", "x", "y"), rec("Alpha", "1", "d")],
    );
    assert!(outcome.is_success());
    assert_eq!(config.record_store().load().unwrap(), vec![rec("Alpha", "1", "d")]);
    let doc = fs::read_to_string(&config.document).unwrap();
    assert_eq!(doc.matches("<article class=\"card\"").count(), 1);
}

#[test]
fn untouched_snapshot_is_stale() {
    let (_dir, config) = setup(false);
    let store = config.record_store();
    store.write_snapshot("[]").unwrap();

    let extractor = move || -> Result<Vec<RawRecord>, ExtractError> {
        Ok(vec![RawRecord::from(rec("Alpha", "1", "d"))])
    };
    let mut orchestrator = Orchestrator::new(extractor, renderer_for(&config).unwrap(), &config);
    assert_eq!(orchestrator.cycle(), CycleOutcome::Stale);
    assert!(!config.store.exists());
    assert_eq!(fs::read_to_string(&config.document).unwrap(), PAGE);
}

#[test]
fn extractor_errors_and_panics_fail_the_cycle() {
    let (_dir, config) = setup(false);

    let failing = || -> Result<Vec<RawRecord>, ExtractError> { Err(ExtractError::Failed {
        command: "scrape".into(),
        status: "exit status: 1".into(),
        stderr: "page did not load".into(),
    }) };
    let mut orchestrator = Orchestrator::new(failing, renderer_for(&config).unwrap(), &config);
    assert!(!orchestrator.run_cycle());

    let panicking = || -> Result<Vec<RawRecord>, ExtractError> { panic!("browser crashed") };
    let mut orchestrator = Orchestrator::new(panicking, renderer_for(&config).unwrap(), &config);
    match orchestrator.cycle() {
        CycleOutcome::ExtractionFailed { reason } => assert!(reason.contains("browser crashed")),
        other => panic!("expected extraction failure, got {other:?}"),
    }
    assert!(!config.store.exists());
}

#[test]
fn malformed_store_continues_with_empty_baseline() {
    let (_dir, config) = setup(false);
    fs::create_dir_all(config.store.parent().unwrap()).unwrap();
    fs::write(&config.store, "{ not a list").unwrap();

    let outcome = cycle_with(&config, vec![rec("Beta", "2", "d")]);
    assert!(outcome.is_success(), "got {outcome:?}");
    assert_eq!(outcome.report().unwrap().added, vec!["Beta"]);
    assert_eq!(config.record_store().load().unwrap(), vec![rec("Beta", "2", "d")]);
}

#[test]
fn strict_baseline_refuses_to_bootstrap() {
    let (_dir, config) = setup(true);
    let outcome = cycle_with(&config, vec![rec("Beta", "2", "d")]);
    assert!(matches!(outcome, CycleOutcome::EmptyBaseline { .. }), "got {outcome:?}");
    assert!(!config.store.exists());
}

#[test]
fn missing_region_fails_publish_without_writing_store() {
    let (_dir, config) = setup(false);
    seed(&config, &[rec("Alpha", "1", "d")]);
    let store_bytes = fs::read(&config.store).unwrap();
    fs::write(&config.document, "<html><main></main></html>").unwrap();

    match cycle_with(&config, vec![rec("Beta", "2", "d")]) {
        CycleOutcome::PublishFailed { phase, reason } => {
            assert_eq!(phase, "render");
            assert!(reason.contains("not found"));
        }
        other => panic!("expected publish failure, got {other:?}"),
    }
    assert_eq!(fs::read(&config.store).unwrap(), store_bytes);
    assert_eq!(fs::read_to_string(&config.document).unwrap(), "<html><main></main></html>");
}

#[test]
fn failed_page_write_is_retried_with_the_same_batch() {
    let (_dir, config) = setup(false);
    let blocker = tmp_path_for(&config.document);
    fs::create_dir_all(&blocker).unwrap();

    match cycle_with(&config, vec![rec("Alpha", "1", "d")]) {
        CycleOutcome::PublishFailed { phase, .. } => assert_eq!(phase, "document"),
        other => panic!("expected publish failure, got {other:?}"),
    }
    assert!(!config.store.exists(), "store must wait for the page");
    assert!(!tmp_path_for(&config.store).exists());

    fs::remove_dir_all(&blocker).unwrap();
    let outcome = cycle_with(&config, vec![rec("Alpha", "1", "d")]);
    assert!(outcome.is_success(), "got {outcome:?}");
    assert_eq!(outcome.report().unwrap().added, vec!["Alpha"]);
    assert!(fs::read_to_string(&config.document).unwrap().contains(">Alpha<"));
    assert_eq!(config.record_store().load().unwrap(), vec![rec("Alpha", "1", "d")]);
}

#[test]
fn backup_holds_the_page_from_just_before_each_publish() {
    let (_dir, config) = setup(false);
    seed(&config, &[rec("Alpha", "1", "d")]);
    let after_first = fs::read_to_string(&config.document).unwrap();

    let outcome = cycle_with(&config, vec![rec("Alpha", "2", "d")]);
    match outcome {
        CycleOutcome::Published { receipt, .. } => {
            assert_eq!(receipt.backup, BackupOutcome::Written { path: config.backup.clone() });
        }
        other => panic!("expected publish, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&config.backup).unwrap(), after_first);
}

#[test]
fn dry_run_reports_but_does_not_write() {
    let (_dir, config) = setup(false);
    let extractor = fresh_batch(config.record_store(), vec![rec("Alpha", "1", "d")]);
    let mut orchestrator =
        Orchestrator::new(extractor, renderer_for(&config).unwrap(), &config).with_mode(PublishMode::DryRun);
    match orchestrator.cycle() {
        CycleOutcome::Published { receipt, .. } => assert!(receipt.is_dry_run()),
        other => panic!("expected dry-run publish, got {other:?}"),
    }
    assert!(!config.store.exists());
    assert!(!config.backup.exists());
    assert_eq!(fs::read_to_string(&config.document).unwrap(), PAGE);
}

#[test]
fn drift_and_diff_follow_the_document() {
    let (_dir, config) = setup(false);
    let renderer = renderer_for(&config).unwrap();
    assert_eq!(check(&config, &renderer).unwrap(), DriftSignal::NeverPublished);

    seed(&config, &[rec("Alpha", "1", "d")]);
    assert_eq!(check(&config, &renderer).unwrap(), DriftSignal::Current);
    assert!(diff_document(&config, &renderer).unwrap().is_none());

    let edited = fs::read_to_string(&config.document).unwrap().replace(">1<", ">tampered<");
    fs::write(&config.document, edited).unwrap();
    assert_eq!(check(&config, &renderer).unwrap(), DriftSignal::Drifted);

    let diff = diff_document(&config, &renderer).unwrap().expect("diff");
    assert!(diff.unified_diff.contains("--- a/index.html"));
    assert!(diff.unified_diff.contains("+++ b/index.html"));
    assert!(diff.unified_diff.contains("-      <div class=\"pass\">tampered</div>"));
    assert!(diff.unified_diff.contains("+      <div class=\"pass\">1</div>"));

    fs::write(&config.document, "<html></html>").unwrap();
    assert!(matches!(
        check(&config, &renderer).unwrap(),
        DriftSignal::RegionMissing { .. }
    ));
}
