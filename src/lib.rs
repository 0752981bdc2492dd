//! sqlcheck: test queries generated from annotated SQL
//!
//! A SQL file declares `__check*` blocks (CTEs yielding `label`, `actual`,
//! `expected`) and optionally `__mock__*` blocks standing in for real tables.
//! This library rewrites the statement so that mocked tables point at their
//! mock blocks, then synthesizes one aggregation query per check block.
//! Running those queries is left to a [`runner::QueryEngine`].

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod parser;
pub mod runner;
pub mod transform;
pub mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use config::{CheckOptions, CheckTemplate};
pub use driver::{
    discover_sql_files, generate_checks_from_file, generate_checks_with, FileChecks,
};
pub use error::SqlCheckError;
pub use parser::{parse_statement, Statement};
pub use transform::{apply_mocks, replace_table, synthesize, CheckQuery, TransformDiagnostic};

/// Options for generating check queries over many files
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Files, directories or glob patterns
    pub inputs: Vec<String>,
    /// Transformer settings
    pub check: CheckOptions,
    /// Directory to write `<file stem>/<label>.sql` into
    pub output_dir: Option<PathBuf>,
    /// Report unparseable files as errors instead of skipping them
    pub strict: bool,
}

/// Generate check queries for every SQL file named by `options.inputs`
pub fn generate_checks(options: &GenerateOptions) -> Result<Vec<FileChecks>> {
    // Step 1: Expand the inputs into SQL files
    let files = driver::discover_sql_files(&options.inputs)?;
    tracing::debug!(count = files.len(), "found SQL files");

    // Step 2: Parse and transform each file
    let generated = driver::generate_checks_for_files(&files, &options.check, options.strict)?;

    let total: usize = generated.iter().map(|f| f.checks.len()).sum();
    tracing::debug!(checks = total, "generated check queries");

    // Step 3: Write the queries out, if asked to
    if let Some(dir) = &options.output_dir {
        for file in &generated {
            let written = driver::write_check_files(file, dir)?;
            tracing::debug!(path = %file.path.display(), files = written.len(), "wrote check queries");
        }
    }

    Ok(generated)
}

/// Apply the mock blocks of one SQL file and return the rewritten statement
pub fn mock_file(path: &Path, options: &CheckOptions) -> Result<transform::MockResolution> {
    let statement = driver::parse_sql_file(path, options)?;
    Ok(transform::resolve_mocks(&statement, options))
}
