//! Substituting mock blocks for the tables they stand in for.

use once_cell::sync::Lazy;
use regex::Regex;

use super::markers::find_marked;
use super::rewrite::replace_table_counted;
use super::TransformDiagnostic;
use crate::config::CheckOptions;
use crate::parser::Statement;

/// Two or more underscores separate the parts of a mangled table name.
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));

/// Recover the qualified table name a mock block stands in for.
///
/// `__mock__project__dataset__table` and `__mock___project___dataset___table`
/// both demangle to `project.dataset.table`.
pub fn demangle(name: &str, prefix: &str) -> String {
    let name = name.trim();
    let rest = name.strip_prefix(prefix).unwrap_or(name);
    SEPARATOR
        .replace_all(rest.trim_matches('_'), ".")
        .into_owned()
}

/// A mock block and the table it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTable {
    /// Block name as declared, used as the replacement reference
    pub name: String,
    /// Qualified table name the block stands in for
    pub target: String,
}

/// Mock blocks declared at the top of `statement`, in declaration order.
pub fn find_mocks(statement: &Statement, prefix: &str) -> Vec<MockTable> {
    find_marked(statement, prefix)
        .iter()
        .map(|block| MockTable {
            name: block.declared_name(),
            target: demangle(block.name(), prefix),
        })
        .collect()
}

/// Result of applying every mock block of a statement.
#[derive(Debug, Clone)]
pub struct MockResolution {
    pub statement: Statement,
    pub mocks: Vec<MockTable>,
    /// One [`TransformDiagnostic::RewriteNoOp`] per mock that matched nothing
    pub diagnostics: Vec<TransformDiagnostic>,
}

/// Point every table reference that a mock block stands in for at that block.
pub fn apply_mocks(statement: &Statement, options: &CheckOptions) -> Statement {
    resolve_mocks(statement, options).statement
}

/// Apply mocks one at a time, in declaration order.
///
/// Mock blocks are collected from the input up front; each rewrite then runs
/// over the whole output of the previous one, mock bodies included.
pub fn resolve_mocks(statement: &Statement, options: &CheckOptions) -> MockResolution {
    let mocks = find_mocks(statement, &options.mock_prefix);
    let mut current = statement.clone();
    let mut diagnostics = Vec::new();

    for mock in &mocks {
        let (rewritten, replaced) = replace_table_counted(&current, &mock.target, &mock.name);
        if replaced == 0 {
            tracing::warn!(
                mock = %mock.name,
                target = %mock.target,
                "mock block does not match any table reference"
            );
            diagnostics.push(TransformDiagnostic::RewriteNoOp {
                mock: mock.name.clone(),
                target: mock.target.clone(),
            });
        } else {
            tracing::debug!(mock = %mock.name, target = %mock.target, replaced, "applied mock");
        }
        current = rewritten;
    }

    MockResolution {
        statement: current,
        mocks,
        diagnostics,
    }
}
