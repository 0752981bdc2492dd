//! Transformer configuration

use std::fmt;

/// Default prefix of check blocks.
pub const DEFAULT_CHECK_PREFIX: &str = "__check";
/// Default prefix of mock blocks.
pub const DEFAULT_MOCK_PREFIX: &str = "__mock__";
/// Default SQL dialect name.
pub const DEFAULT_DIALECT: &str = "bigquery";

/// Aggregation appended to a statement for each check block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CheckTemplate {
    /// `countif(actual != expected)`: one row per label, passing labels included
    #[default]
    CountIf,
    /// `count(1) ... where actual != expected`: rows only for failing labels
    CountWhere,
}

impl CheckTemplate {
    /// Template text with `{table}` marking where the check block name goes.
    pub fn text(self, limit: Option<u32>) -> String {
        let mut sql = match self {
            CheckTemplate::CountIf => "select\n  label, countif(actual != expected) as errors\nfrom {table}\ngroup by label".to_string(),
            CheckTemplate::CountWhere => "select\n  label, count(1) as errors\nfrom {table}\nwhere actual != expected\ngroup by label".to_string(),
        };
        if let Some(limit) = limit {
            sql.push_str(&format!("\nlimit {}", limit));
        }
        sql
    }
}

impl fmt::Display for CheckTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckTemplate::CountIf => write!(f, "count-if"),
            CheckTemplate::CountWhere => write!(f, "count-where"),
        }
    }
}

/// Options controlling how check queries are generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Name prefix of check blocks
    pub check_prefix: String,
    /// Name prefix of mock blocks
    pub mock_prefix: String,
    /// Aggregation appended for each check block
    pub template: CheckTemplate,
    /// Optional `limit` on the aggregation
    pub limit: Option<u32>,
    /// SQL dialect used for tokenizing (e.g., "bigquery", "generic")
    pub dialect: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_prefix: DEFAULT_CHECK_PREFIX.to_string(),
            mock_prefix: DEFAULT_MOCK_PREFIX.to_string(),
            template: CheckTemplate::default(),
            limit: None,
            dialect: DEFAULT_DIALECT.to_string(),
        }
    }
}
