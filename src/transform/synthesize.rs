//! Building one aggregation query per check block.

use sqlparser::dialect::Dialect;

use super::markers::find_marked;
use super::mock::resolve_mocks;
use super::TransformDiagnostic;
use crate::config::CheckOptions;
use crate::error::SqlCheckError;
use crate::parser::{parse_fragment, resolve_dialect, Node, Statement};

/// Placeholder for the check block name inside a template.
const TABLE_PLACEHOLDER: &str = "{table}";

/// A synthesized validation query for one check block.
#[derive(Debug, Clone)]
pub struct CheckQuery {
    /// Block name unquoted, with leading underscores removed (e.g. "check")
    pub label: String,
    /// Block name as declared (e.g. "__check")
    pub name: String,
    /// Mocked statement truncated at its main query, followed by the aggregation
    pub statement: Statement,
}

impl CheckQuery {
    /// SQL text to hand to a query engine.
    pub fn sql(&self) -> String {
        self.statement.to_string()
    }
}

/// Generates check queries from parsed statements.
///
/// The aggregation template is parsed once, split around the place where the
/// check block name goes.
#[derive(Debug, Clone)]
pub struct CheckSynthesizer {
    options: CheckOptions,
    head: Vec<Node>,
    tail: Vec<Node>,
}

impl CheckSynthesizer {
    pub fn new(options: &CheckOptions) -> Result<Self, SqlCheckError> {
        let dialect = resolve_dialect(&options.dialect)?;
        Self::with_dialect(options, dialect.as_ref())
    }

    pub fn with_dialect(options: &CheckOptions, dialect: &dyn Dialect) -> Result<Self, SqlCheckError> {
        let template = options.template.text(options.limit);
        let (head, tail) = template
            .split_once(TABLE_PLACEHOLDER)
            .unwrap_or((template.as_str(), ""));

        Ok(Self {
            options: options.clone(),
            head: parse_fragment(head, dialect)?,
            tail: parse_fragment(tail, dialect)?,
        })
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Lazily produce one [`CheckQuery`] per check block of `statement`.
    ///
    /// Mocks are applied first. The statement is cut at its first top-level
    /// DML keyword; without one there is nothing to check and the sequence is
    /// empty.
    pub fn synthesize(&self, statement: &Statement) -> CheckQueries {
        let resolution = resolve_mocks(statement, &self.options);
        let mut diagnostics = resolution.diagnostics;
        let mocked = resolution.statement;

        let Some(boundary) = mocked.first_dml_index() else {
            tracing::debug!("statement has no top-level DML keyword");
            diagnostics.push(TransformDiagnostic::NoDmlFound);
            return CheckQueries {
                diagnostics,
                ..CheckQueries::empty()
            };
        };

        let blocks: Vec<BlockName> = find_marked(&mocked, &self.options.check_prefix)
            .into_iter()
            .filter_map(|block| {
                let node = block.name_node()?.clone();
                Some(BlockName {
                    label: block.name().trim_start_matches('_').to_string(),
                    declared: block.declared_name(),
                    node,
                })
            })
            .collect();

        CheckQueries {
            mocked: Some(mocked),
            boundary,
            blocks: blocks.into_iter(),
            head: self.head.clone(),
            tail: self.tail.clone(),
            diagnostics,
        }
    }
}

/// Synthesize check queries with the default options.
pub fn synthesize(statement: &Statement) -> Result<CheckQueries, SqlCheckError> {
    Ok(CheckSynthesizer::new(&CheckOptions::default())?.synthesize(statement))
}

/// Name of one check block: its label, its text as written, and the
/// identifier node that goes into the template.
#[derive(Debug)]
struct BlockName {
    label: String,
    declared: String,
    node: Node,
}

/// Iterator over the check queries of one statement.
#[derive(Debug)]
pub struct CheckQueries {
    mocked: Option<Statement>,
    boundary: usize,
    blocks: std::vec::IntoIter<BlockName>,
    head: Vec<Node>,
    tail: Vec<Node>,
    diagnostics: Vec<TransformDiagnostic>,
}

impl CheckQueries {
    /// A sequence that yields nothing.
    pub fn empty() -> Self {
        Self {
            mocked: None,
            boundary: 0,
            blocks: Vec::new().into_iter(),
            head: Vec::new(),
            tail: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Non-fatal findings from transforming the statement.
    pub fn diagnostics(&self) -> &[TransformDiagnostic] {
        &self.diagnostics
    }

    /// The statement after mocks were applied, when it has a main query.
    pub fn mocked(&self) -> Option<&Statement> {
        self.mocked.as_ref()
    }
}

impl Iterator for CheckQueries {
    type Item = CheckQuery;

    fn next(&mut self) -> Option<Self::Item> {
        let mocked = self.mocked.as_ref()?;
        let block = self.blocks.next()?;

        let aggregation = self
            .head
            .iter()
            .cloned()
            .chain(std::iter::once(block.node))
            .chain(self.tail.iter().cloned());
        let statement = mocked.splice_from(self.boundary, aggregation);

        Some(CheckQuery {
            label: block.label,
            name: block.declared,
            statement,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.mocked.is_some() {
            self.blocks.size_hint()
        } else {
            (0, Some(0))
        }
    }
}
