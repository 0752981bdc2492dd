//! Running check queries against a query engine.
//!
//! The engine itself is supplied by the caller through [`QueryEngine`]; this
//! module owns everything around it: the scan budget check on a dry run,
//! mapping `(label, errors)` rows to pass/fail, and keeping one failing check
//! from hiding the results of its siblings.

pub mod report;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::driver::generate_checks_with;
use crate::error::SqlCheckError;
use crate::transform::{CheckQuery, CheckSynthesizer, TransformDiagnostic};

/// A query submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJob {
    /// `<prefix>-<first 16 hex chars of the SHA-256 of the SQL>`
    pub job_id: String,
    pub sql: String,
    /// Upper bound on bytes billed for the real run
    pub maximum_bytes_billed: u64,
}

impl QueryJob {
    pub fn new(prefix: &str, sql: &str, maximum_bytes_billed: u64) -> Self {
        let digest = hex::encode(Sha256::digest(sql.as_bytes()));
        Self {
            job_id: format!("{}-{}", prefix, &digest[..16]),
            sql: sql.to_string(),
            maximum_bytes_billed,
        }
    }
}

/// Result of a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DryRunEstimate {
    pub total_bytes_processed: u64,
}

/// One row of a check query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelErrors {
    pub label: String,
    pub errors: i64,
}

/// Rows and timing of an executed job.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub rows: Vec<LabelErrors>,
    pub created: DateTime<Utc>,
    pub ended: DateTime<Utc>,
}

impl QueryOutcome {
    pub fn elapsed(&self) -> Duration {
        self.ended - self.created
    }
}

/// Position of an error inside the submitted SQL (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

static LOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+):(\d+)\]").expect("valid regex"));

impl ErrorLocation {
    /// Extract the last `[line:column]` marker from an engine message.
    pub fn from_message(message: &str) -> Option<Self> {
        let caps = LOCATION.captures_iter(message).last()?;
        Some(Self {
            line: caps.get(1)?.as_str().parse().ok()?,
            column: caps.get(2)?.as_str().parse().ok()?,
        })
    }
}

/// Error reported by a query engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    pub location: Option<ErrorLocation>,
}

impl EngineError {
    /// Build an error, taking its location from the message when present.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let location = ErrorLocation::from_message(&message);
        Self { message, location }
    }
}

/// A query engine able to estimate and run SQL.
pub trait QueryEngine {
    /// Validate `job` and estimate the bytes it would scan, without running it.
    fn dry_run(&self, job: &QueryJob) -> Result<DryRunEstimate, EngineError>;

    /// Run `job`, returning `(label, errors)` rows.
    fn execute(&self, job: &QueryJob) -> Result<QueryOutcome, EngineError>;
}

impl<T: QueryEngine + ?Sized> QueryEngine for &T {
    fn dry_run(&self, job: &QueryJob) -> Result<DryRunEstimate, EngineError> {
        (**self).dry_run(job)
    }

    fn execute(&self, job: &QueryJob) -> Result<QueryOutcome, EngineError> {
        (**self).execute(job)
    }
}

/// Why a check could not produce results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunFailure {
    #[error("query would scan {estimated} bytes, over the limit of {limit} bytes")]
    ScanLimitExceeded { estimated: u64, limit: u64 },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Failed,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Passed => "PASSED",
            CheckStatus::Failed => "FAILED",
        }
    }
}

/// Result of one label of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelResult {
    pub label: String,
    pub errors: i64,
    pub status: CheckStatus,
}

impl From<LabelErrors> for LabelResult {
    fn from(row: LabelErrors) -> Self {
        let status = if row.errors == 0 {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        Self {
            label: row.label,
            errors: row.errors,
            status,
        }
    }
}

/// Outcome of running one check block.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Check label (e.g. "check")
    pub name: String,
    pub source: PathBuf,
    pub query: String,
    /// Dry-run estimate, when the dry run succeeded
    pub total_bytes_processed: Option<u64>,
    pub outcome: Result<Vec<LabelResult>, RunFailure>,
}

impl CheckReport {
    pub fn is_passed(&self) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(|labels| labels.iter().all(|l| l.status == CheckStatus::Passed))
    }

    pub fn failed_labels(&self) -> Vec<&LabelResult> {
        match &self.outcome {
            Ok(labels) => labels
                .iter()
                .filter(|l| l.status == CheckStatus::Failed)
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Outcomes of every check block of one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub checks: Vec<CheckReport>,
    pub diagnostics: Vec<TransformDiagnostic>,
}

impl FileReport {
    pub fn is_passed(&self) -> bool {
        self.checks.iter().all(CheckReport::is_passed)
    }

    pub fn check(&self, name: &str) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Largest dry-run estimate allowed to run, in bytes
    pub scan_limit_bytes: u64,
    /// Prefix of generated job ids
    pub job_id_prefix: String,
    /// Jobs slower than this are logged as warnings
    pub slow_query_threshold: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            scan_limit_bytes: 50 * 1_000_000_000,
            job_id_prefix: "sqlcheck".to_string(),
            slow_query_threshold: Duration::seconds(60),
        }
    }
}

/// Runs check queries through an explicitly supplied engine.
pub struct CheckRunner<E> {
    engine: E,
    config: RunnerConfig,
}

impl<E: QueryEngine> CheckRunner<E> {
    pub fn new(engine: E, config: RunnerConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Dry-run `check`, then run it if it fits the scan budget.
    pub fn run_check(&self, source: &Path, check: &CheckQuery) -> CheckReport {
        let query = check.sql();
        let job = QueryJob::new(&self.config.job_id_prefix, &query, self.config.scan_limit_bytes);

        let mut total_bytes_processed = None;
        let outcome = self.run_job(source, &check.label, &job, &mut total_bytes_processed);
        if let Err(failure) = &outcome {
            tracing::debug!(check = %check.label, job_id = %job.job_id, error = %failure, "check failed to run");
        }

        CheckReport {
            name: check.label.clone(),
            source: source.to_path_buf(),
            query,
            total_bytes_processed,
            outcome,
        }
    }

    fn run_job(
        &self,
        source: &Path,
        name: &str,
        job: &QueryJob,
        total_bytes_processed: &mut Option<u64>,
    ) -> Result<Vec<LabelResult>, RunFailure> {
        let estimate = self.engine.dry_run(job)?;
        *total_bytes_processed = Some(estimate.total_bytes_processed);

        if estimate.total_bytes_processed > self.config.scan_limit_bytes {
            return Err(RunFailure::ScanLimitExceeded {
                estimated: estimate.total_bytes_processed,
                limit: self.config.scan_limit_bytes,
            });
        }

        let outcome = self.engine.execute(job)?;
        let elapsed = outcome.elapsed();
        if elapsed > self.config.slow_query_threshold {
            tracing::warn!(
                path = %source.display(),
                check = %name,
                seconds = elapsed.num_milliseconds() as f64 / 1000.0,
                "slow check query"
            );
        }

        Ok(outcome.rows.into_iter().map(LabelResult::from).collect())
    }

    /// Generate and run every check of a SQL file.
    ///
    /// Checks run one after another; a failure in one is recorded in its
    /// report and does not stop the others.
    pub fn run_file(
        &self,
        path: &Path,
        synthesizer: &CheckSynthesizer,
    ) -> Result<FileReport, SqlCheckError> {
        let mut queries = generate_checks_with(path, synthesizer)?;
        let diagnostics = queries.diagnostics().to_vec();
        let checks = queries
            .by_ref()
            .map(|check| self.run_check(path, &check))
            .collect();

        Ok(FileReport {
            path: path.to_path_buf(),
            checks,
            diagnostics,
        })
    }
}
