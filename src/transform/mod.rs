//! Statement transformations: marker scanning, mock substitution and check
//! query synthesis

pub mod markers;
pub mod mock;
pub mod rewrite;
pub mod synthesize;

use std::fmt;

pub use markers::{find_marked, has_marked, MarkedBlock};
pub use mock::{apply_mocks, demangle, find_mocks, resolve_mocks, MockResolution, MockTable};
pub use rewrite::{find_table_references, replace_table, replace_table_counted};
pub use synthesize::{synthesize, CheckQueries, CheckQuery, CheckSynthesizer};

/// Non-fatal findings produced while transforming a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformDiagnostic {
    /// The statement has no top-level DML keyword, so no check can be built
    NoDmlFound,
    /// A mock block matched no table reference; usually a naming mistake
    RewriteNoOp { mock: String, target: String },
}

impl fmt::Display for TransformDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformDiagnostic::NoDmlFound => write!(f, "no top-level DML statement found"),
            TransformDiagnostic::RewriteNoOp { mock, target } => write!(
                f,
                "mock {} does not replace any reference to {}",
                mock, target
            ),
        }
    }
}
