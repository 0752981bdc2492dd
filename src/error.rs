//! Error types for sqlcheck

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, parsing or transforming SQL files
#[derive(Error, Debug)]
pub enum SqlCheckError {
    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL file {path} is not valid {encoding} text")]
    SqlDecodeError {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("SQL parse error at line {line}, column {column}: {message}")]
    SqlParseError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("No SQL statement found in input")]
    EmptyStatement,

    #[error("Unknown SQL dialect: {name}")]
    UnknownDialect { name: String },

    #[error("Invalid input pattern {pattern}: {message}")]
    InvalidInputPattern { pattern: String, message: String },

    #[error("Failed to write generated query to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<sqlparser::tokenizer::TokenizerError> for SqlCheckError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        SqlCheckError::SqlParseError {
            line: err.location.line as usize,
            column: err.location.column as usize,
            message: err.message,
        }
    }
}

impl SqlCheckError {
    /// Whether this error means the input could not be parsed as a statement.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            SqlCheckError::SqlParseError { .. } | SqlCheckError::EmptyStatement
        )
    }
}
