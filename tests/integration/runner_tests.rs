//! Integration tests for running check queries through a query engine

use chrono::Duration;
use pretty_assertions::assert_eq;

use sqlcheck::config::CheckOptions;
use sqlcheck::runner::report::failure_message;
use sqlcheck::runner::{CheckRunner, CheckStatus, ErrorLocation, RunFailure, RunnerConfig};
use sqlcheck::transform::CheckSynthesizer;

use crate::common::{fixture_path, FakeEngine};

fn synthesizer() -> CheckSynthesizer {
    CheckSynthesizer::new(&CheckOptions::default()).unwrap()
}

#[test]
fn test_all_labels_pass() {
    let engine = FakeEngine::new(1024)
        .with_rows("__check_total", &[("total", 0)])
        .with_rows("__check_rows", &[("rows", 0)]);
    let runner = CheckRunner::new(&engine, RunnerConfig::default());

    let report = runner
        .run_file(&fixture_path("orders.sql"), &synthesizer())
        .unwrap();

    assert!(report.is_passed());
    assert_eq!(report.checks.len(), 2);
    assert_eq!(report.check("check_total").unwrap().total_bytes_processed, Some(1024));
    assert_eq!(engine.executed_count(), 2);
}

#[test]
fn test_failed_label_is_reported() {
    let engine = FakeEngine::new(0)
        .with_rows("__check_total", &[("total", 3), ("other", 0)])
        .with_rows("__check_rows", &[("rows", 0)]);
    let runner = CheckRunner::new(&engine, RunnerConfig::default());

    let report = runner
        .run_file(&fixture_path("orders.sql"), &synthesizer())
        .unwrap();

    assert!(!report.is_passed());
    let total = report.check("check_total").unwrap();
    let failed: Vec<&str> = total
        .failed_labels()
        .into_iter()
        .map(|l| l.label.as_str())
        .collect();
    assert_eq!(failed, vec!["total"]);
    assert!(report.check("check_rows").unwrap().is_passed());
}

#[test]
fn test_over_budget_query_is_not_executed() {
    let engine = FakeEngine::new(2_000).with_rows("__check", &[("test", 0)]);
    let config = RunnerConfig {
        scan_limit_bytes: 1_000,
        ..RunnerConfig::default()
    };
    let runner = CheckRunner::new(&engine, config);

    let report = runner
        .run_file(&fixture_path("testable.sql"), &synthesizer())
        .unwrap();

    let check = &report.checks[0];
    assert_eq!(
        check.outcome,
        Err(RunFailure::ScanLimitExceeded {
            estimated: 2_000,
            limit: 1_000,
        })
    );
    assert_eq!(engine.dry_runs.lock().unwrap().len(), 1);
    assert_eq!(engine.executed_count(), 0);
}

#[test]
fn test_engine_error_is_isolated_per_check() {
    let engine = FakeEngine::new(0)
        .with_error("__check_total", "Unrecognized name: total at [17:12]")
        .with_rows("__check_rows", &[("rows", 0)]);
    let runner = CheckRunner::new(&engine, RunnerConfig::default());

    let report = runner
        .run_file(&fixture_path("orders.sql"), &synthesizer())
        .unwrap();

    let total = report.check("check_total").unwrap();
    match &total.outcome {
        Err(RunFailure::Engine(err)) => {
            assert_eq!(err.location, Some(ErrorLocation { line: 17, column: 12 }));
        }
        other => panic!("expected engine error, got {:?}", other),
    }
    let message = failure_message(total).unwrap();
    assert!(message.contains("7:\t"));
    assert!(message.ends_with("Message: Unrecognized name: total at [17:12]"));

    let rows = report.check("check_rows").unwrap();
    assert_eq!(
        rows.outcome.as_ref().unwrap()[0].status,
        CheckStatus::Passed
    );
}

#[test]
fn test_job_ids_use_prefix_and_differ_per_check() {
    let engine = FakeEngine::new(0)
        .with_rows("__check_total", &[("total", 0)])
        .with_rows("__check_rows", &[("rows", 0)]);
    let config = RunnerConfig {
        job_id_prefix: "ci".to_string(),
        ..RunnerConfig::default()
    };
    let runner = CheckRunner::new(&engine, config);
    runner
        .run_file(&fixture_path("orders.sql"), &synthesizer())
        .unwrap();

    let executed = engine.executed.lock().unwrap();
    assert!(executed.iter().all(|job| job.job_id.starts_with("ci-")));
    assert_ne!(executed[0].job_id, executed[1].job_id);
    assert!(executed.iter().all(|job| job.maximum_bytes_billed == 50_000_000_000));
}

#[test]
fn test_slow_query_still_reports_results() {
    let engine = FakeEngine::new(0)
        .with_rows("__check", &[("test", 0)])
        .with_elapsed(Duration::seconds(120));
    let runner = CheckRunner::new(&engine, RunnerConfig::default());

    let report = runner
        .run_file(&fixture_path("testable.sql"), &synthesizer())
        .unwrap();
    assert!(report.is_passed());
}

#[test]
fn test_file_without_checks_runs_nothing() {
    let engine = FakeEngine::new(0);
    let runner = CheckRunner::new(&engine, RunnerConfig::default());

    let report = runner
        .run_file(&fixture_path("empty.sql"), &synthesizer())
        .unwrap();
    assert!(report.checks.is_empty());
    assert!(report.is_passed());
    assert_eq!(engine.dry_runs.lock().unwrap().len(), 0);
}
