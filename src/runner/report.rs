//! Human-readable check report formatting

use std::fmt::Write as _;

use super::{CheckReport, CheckStatus, FileReport, LabelResult, RunFailure};
use crate::util::excerpt_start;

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Lines of query shown before the line an engine error points at.
const EXCERPT_CONTEXT: usize = 10;

/// Minimum gap between a header and its column edge.
const HEADER_PADDING: usize = 2;

/// Scale a byte count by powers of 1024, up to terabytes.
pub fn bytes_to_human_readable(bytes: u64) -> (f64, &'static str) {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    (size, UNITS[unit])
}

/// `"  1.50 KB"` style size, as shown in summary lines.
pub fn format_size(bytes: u64) -> String {
    let (size, unit) = bytes_to_human_readable(bytes);
    format!("{:5.2} {}", size, unit)
}

/// One-line summary: `name(path) [size]`, or `[error]` without an estimate.
pub fn summary_line(check: &CheckReport) -> String {
    let size = match check.total_bytes_processed {
        Some(bytes) if check.outcome.is_ok() => format_size(bytes),
        _ => "error".to_string(),
    };
    format!("{}({}) [{}]", check.name, check.source.display(), size)
}

/// Table of every label of a check; failed labels are marked with `*`.
pub fn format_label_table(results: &[LabelResult]) -> String {
    let headers = ["label", "status", "error"];
    let rows: Vec<[String; 3]> = results
        .iter()
        .map(|r| {
            let label = match r.status {
                CheckStatus::Passed => r.label.clone(),
                CheckStatus::Failed => format!("*{}", r.label),
            };
            [label, r.status.as_str().to_string(), r.errors.to_string()]
        })
        .collect();

    let mut widths = headers.map(|h| h.len() + HEADER_PADDING);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 3]| -> String {
        format!(
            "{:<w0$}  {:<w1$}  {:>w2$}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
        .trim_end()
        .to_string()
    };

    let mut lines = vec![
        render(headers),
        widths.map(|w| "-".repeat(w)).join("  "),
    ];
    for row in &rows {
        lines.push(render([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }
    lines.join("\n")
}

/// Numbered excerpt of `query` starting a few lines before `line`.
///
/// Line numbers are printed from the first shown line, 0-based like the
/// offsets an engine reports relative to the start of the excerpt.
pub fn query_excerpt(query: &str, line: usize) -> String {
    let start = excerpt_start(line, EXCERPT_CONTEXT);
    query
        .lines()
        .enumerate()
        .skip(start)
        .map(|(ix, text)| format!("{}:\t{}", ix, text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Explanation of why a check did not pass, or `None` when it passed.
pub fn failure_message(check: &CheckReport) -> Option<String> {
    match &check.outcome {
        Ok(labels) => {
            if labels.iter().all(|l| l.status == CheckStatus::Passed) {
                return None;
            }
            Some(format!(
                "some results of {} are wrong\n{}",
                check.name,
                format_label_table(labels)
            ))
        }
        Err(RunFailure::ScanLimitExceeded { estimated, limit }) => Some(format!(
            "in {}\nquery would scan {}, over the limit of {}",
            check.source.display(),
            format_size(*estimated).trim_start(),
            format_size(*limit).trim_start()
        )),
        Err(RunFailure::Engine(err)) => {
            let line = err.location.map_or(0, |l| l.line);
            Some(format!(
                "in {}\n{}\n\n---\nMessage: {}",
                check.source.display(),
                query_excerpt(&check.query, line),
                err.message
            ))
        }
    }
}

/// Render the report of one file: a summary line per check, then details of
/// every check that did not pass.
pub fn render_file_report(report: &FileReport) -> String {
    let mut out = String::new();

    for check in &report.checks {
        let status = if check.is_passed() { "PASSED" } else { "FAILED" };
        let _ = writeln!(out, "{} {}", summary_line(check), status);
    }

    for diagnostic in &report.diagnostics {
        let _ = writeln!(out, "warning: {}", diagnostic);
    }

    for check in &report.checks {
        if let Some(message) = failure_message(check) {
            let _ = writeln!(out);
            let _ = writeln!(out, "--- {} ---", check.name);
            let _ = writeln!(out, "{}", message);
        }
    }

    out
}

/// Print the reports of several files to stdout, followed by a total.
pub fn print_report(reports: &[FileReport]) {
    for report in reports {
        print!("{}", render_file_report(report));
        println!();
    }

    let total: usize = reports.iter().map(|r| r.checks.len()).sum();
    let failed: usize = reports
        .iter()
        .flat_map(|r| &r.checks)
        .filter(|c| !c.is_passed())
        .count();
    println!("=== {} checks, {} passed, {} failed ===", total, total - failed, failed);
}
