//! SQL parsing into a lossless token tree

pub mod cursor;
mod grouping;
mod lexer;
pub mod tree;

use sqlparser::dialect::{BigQueryDialect, Dialect};

pub use cursor::{EntryId, FlatView};
pub use lexer::{resolve_dialect, tokenize};
pub use tree::{Group, GroupKind, Node, Statement, Token, TokenKind};

use crate::error::SqlCheckError;

/// Parse the first statement of `sql` using the BigQuery dialect.
pub fn parse_statement(sql: &str) -> Result<Statement, SqlCheckError> {
    parse_statement_with(sql, &BigQueryDialect {})
}

/// Parse the first statement of `sql`.
///
/// The statement runs up to and including the first top-level `;`. Text after
/// that semicolon belongs to the statement only when it is whitespace or
/// comments, so a single-statement file round-trips byte for byte.
pub fn parse_statement_with(sql: &str, dialect: &dyn Dialect) -> Result<Statement, SqlCheckError> {
    let mut tokens = tokenize(sql, dialect)?;
    if tokens.is_empty() {
        return Err(SqlCheckError::EmptyStatement);
    }

    if let Some(end) = first_statement_end(&tokens) {
        if tokens[end + 1..].iter().any(|t| !t.is_trivia()) {
            tracing::debug!(
                dropped_tokens = tokens.len() - end - 1,
                "ignoring statements after the first one"
            );
            tokens.truncate(end + 1);
        }
    }

    Ok(Statement::new(grouping::build_tree(tokens)))
}

/// Parse a fragment (no statement splitting), e.g. a query template.
pub(crate) fn parse_fragment(sql: &str, dialect: &dyn Dialect) -> Result<Vec<Node>, SqlCheckError> {
    Ok(grouping::build_tree(tokenize(sql, dialect)?))
}

/// Index of the first semicolon outside any parenthesis.
fn first_statement_end(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind() {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
