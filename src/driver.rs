//! Reading SQL files and driving the transformation pipeline

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::CheckOptions;
use crate::error::SqlCheckError;
use crate::parser::{parse_statement_with, resolve_dialect, Statement};
use crate::transform::{CheckQueries, CheckQuery, CheckSynthesizer, TransformDiagnostic};

/// Minimum number of files to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Read a SQL file as text.
///
/// A byte-order mark selects the encoding (UTF-8 or UTF-16) and is stripped;
/// files without one must be valid UTF-8.
pub fn read_sql_file(path: &Path) -> Result<String, SqlCheckError> {
    let bytes = std::fs::read(path).map_err(|e| SqlCheckError::SqlFileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (encoding, bom_len) =
        encoding_rs::Encoding::for_bom(&bytes).unwrap_or((encoding_rs::UTF_8, 0));

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| text.into_owned())
        .ok_or_else(|| SqlCheckError::SqlDecodeError {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        })
}

/// Read and parse the single statement of a SQL file.
pub fn parse_sql_file(path: &Path, options: &CheckOptions) -> Result<Statement, SqlCheckError> {
    let sql = read_sql_file(path)?;
    let dialect = resolve_dialect(&options.dialect)?;
    parse_statement_with(&sql, dialect.as_ref())
}

/// Check queries of a SQL file, using the default options.
///
/// A file that does not parse (including an empty file) yields no checks.
pub fn generate_checks_from_file(path: &Path) -> Result<CheckQueries, SqlCheckError> {
    let synthesizer = CheckSynthesizer::new(&CheckOptions::default())?;
    generate_checks_with(path, &synthesizer)
}

/// Check queries of a SQL file.
///
/// Read failures are errors; parse failures degrade to an empty sequence.
pub fn generate_checks_with(
    path: &Path,
    synthesizer: &CheckSynthesizer,
) -> Result<CheckQueries, SqlCheckError> {
    match generate_checks_strict(path, synthesizer) {
        Err(e) if e.is_parse_error() => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unparseable SQL file");
            Ok(CheckQueries::empty())
        }
        other => other,
    }
}

/// Check queries of a SQL file, surfacing parse failures as errors.
pub fn generate_checks_strict(
    path: &Path,
    synthesizer: &CheckSynthesizer,
) -> Result<CheckQueries, SqlCheckError> {
    let statement = parse_sql_file(path, synthesizer.options())?;
    Ok(synthesizer.synthesize(&statement))
}

/// Check queries generated for one file.
#[derive(Debug)]
pub struct FileChecks {
    pub path: PathBuf,
    pub checks: Vec<CheckQuery>,
    pub diagnostics: Vec<TransformDiagnostic>,
}

/// Generate the check queries of many files, in parallel for larger sets.
///
/// Results keep the order of `files`. If any file fails, one of the errors
/// is returned.
pub fn generate_checks_for_files(
    files: &[PathBuf],
    options: &CheckOptions,
    strict: bool,
) -> Result<Vec<FileChecks>, SqlCheckError> {
    let synthesizer = CheckSynthesizer::new(options)?;

    let generate = |path: &PathBuf| -> Result<FileChecks, SqlCheckError> {
        let queries = if strict {
            generate_checks_strict(path, &synthesizer)?
        } else {
            generate_checks_with(path, &synthesizer)?
        };
        let diagnostics = queries.diagnostics().to_vec();
        Ok(FileChecks {
            path: path.clone(),
            checks: queries.collect(),
            diagnostics,
        })
    };

    if files.len() >= PARALLEL_THRESHOLD {
        files.par_iter().map(generate).collect()
    } else {
        files.iter().map(generate).collect()
    }
}

/// Write each check of `file` to `dir/<file stem>/<label>.sql`.
pub fn write_check_files(file: &FileChecks, dir: &Path) -> Result<Vec<PathBuf>, SqlCheckError> {
    let stem = file
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("query");
    let target_dir = dir.join(stem);

    let mut written = Vec::with_capacity(file.checks.len());
    for check in &file.checks {
        let path = target_dir.join(format!("{}.sql", check.label));
        std::fs::create_dir_all(&target_dir)
            .and_then(|_| std::fs::write(&path, check.sql()))
            .map_err(|e| SqlCheckError::OutputWriteError {
                path: path.clone(),
                source: e,
            })?;
        written.push(path);
    }
    Ok(written)
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Expand inputs into a sorted, de-duplicated list of SQL files.
///
/// Directories are searched recursively for `.sql` files and glob patterns
/// are expanded; any other input is taken as a file path as-is.
pub fn discover_sql_files(inputs: &[String]) -> Result<Vec<PathBuf>, SqlCheckError> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_sql_file(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if !path.exists() && is_glob(input) {
            let paths = glob::glob(input).map_err(|e| SqlCheckError::InvalidInputPattern {
                pattern: input.clone(),
                message: e.to_string(),
            })?;
            files.extend(paths.filter_map(|p| p.ok()).filter(|p| is_sql_file(p)));
        } else {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
