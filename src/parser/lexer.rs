//! Lexing SQL into leaf tokens that keep their exact source text.
//!
//! Tokenization is delegated to the `sqlparser` tokenizer. Its tokens are
//! normalized values (unescaped strings, unquoted identifiers), so the text
//! of each token is instead sliced out of the source between the start of
//! that token's span and the start of the next one. Whitespace and comments
//! are tokens too, which makes the concatenation of all token texts equal to
//! the input.

use sqlparser::dialect::{dialect_from_str, Dialect};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token as SqlToken, TokenWithSpan, Tokenizer, Whitespace};

use super::tree::{Token, TokenKind};
use crate::error::SqlCheckError;

/// Resolve a dialect by name (`bigquery`, `generic`, `ansi`, ...).
pub fn resolve_dialect(name: &str) -> Result<Box<dyn Dialect>, SqlCheckError> {
    dialect_from_str(name).ok_or_else(|| SqlCheckError::UnknownDialect {
        name: name.to_string(),
    })
}

/// Tokenize `sql`, returning tokens whose texts concatenate back to `sql`.
pub fn tokenize(sql: &str, dialect: &dyn Dialect) -> Result<Vec<Token>, SqlCheckError> {
    let raw = Tokenizer::new(dialect, sql).tokenize_with_location()?;
    let index = LineIndex::new(sql);

    let mut starts = Vec::with_capacity(raw.len() + 1);
    for (i, token) in raw.iter().enumerate() {
        let start = if i == 0 {
            0
        } else {
            index
                .offset(sql, token.span.start)
                .ok_or_else(|| span_error(token))?
        };
        if starts.last().is_some_and(|prev| *prev > start) {
            return Err(span_error(token));
        }
        starts.push(start);
    }
    starts.push(sql.len());

    Ok(raw
        .iter()
        .zip(starts.windows(2))
        .map(|(token, bounds)| Token::new(classify(&token.token), &sql[bounds[0]..bounds[1]]))
        .collect())
}

fn span_error(token: &TokenWithSpan) -> SqlCheckError {
    SqlCheckError::SqlParseError {
        line: token.span.start.line as usize,
        column: token.span.start.column as usize,
        message: format!("token {} has no position in the source", token.token),
    }
}

/// Maps tokenizer locations (1-based line, 1-based character column) to byte offsets.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(sql: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(sql.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn offset(&self, sql: &str, location: Location) -> Option<usize> {
        let line = (location.line as usize).checked_sub(1)?;
        let column = (location.column as usize).checked_sub(1)?;
        let line_start = *self.starts.get(line)?;
        let line_end = self.starts.get(line + 1).copied().unwrap_or(sql.len());
        let text = &sql[line_start..line_end];

        match text.char_indices().nth(column) {
            Some((byte, _)) => Some(line_start + byte),
            None if text.chars().count() == column => Some(line_end),
            None => None,
        }
    }
}

/// DML keywords that start the main body of a statement.
const DML_KEYWORDS: &[Keyword] = &[
    Keyword::SELECT,
    Keyword::INSERT,
    Keyword::UPDATE,
    Keyword::DELETE,
    Keyword::MERGE,
];

/// Keywords that shape clause structure. Any other word is treated as a name,
/// since most SQL keywords are also valid column or function names.
const STRUCTURAL_KEYWORDS: &[Keyword] = &[
    Keyword::WITH,
    Keyword::RECURSIVE,
    Keyword::AS,
    Keyword::FROM,
    Keyword::JOIN,
    Keyword::INNER,
    Keyword::LEFT,
    Keyword::RIGHT,
    Keyword::FULL,
    Keyword::OUTER,
    Keyword::CROSS,
    Keyword::LATERAL,
    Keyword::ON,
    Keyword::USING,
    Keyword::WHERE,
    Keyword::GROUP,
    Keyword::BY,
    Keyword::ORDER,
    Keyword::HAVING,
    Keyword::QUALIFY,
    Keyword::WINDOW,
    Keyword::LIMIT,
    Keyword::OFFSET,
    Keyword::UNION,
    Keyword::INTERSECT,
    Keyword::EXCEPT,
    Keyword::ALL,
    Keyword::DISTINCT,
    Keyword::AND,
    Keyword::OR,
    Keyword::NOT,
    Keyword::IN,
    Keyword::IS,
    Keyword::NULL,
    Keyword::LIKE,
    Keyword::BETWEEN,
    Keyword::CASE,
    Keyword::WHEN,
    Keyword::THEN,
    Keyword::ELSE,
    Keyword::END,
    Keyword::OVER,
    Keyword::PARTITION,
    Keyword::ROWS,
    Keyword::RANGE,
    Keyword::ASC,
    Keyword::DESC,
    Keyword::NULLS,
    Keyword::INTO,
    Keyword::VALUES,
    Keyword::SET,
    Keyword::EXISTS,
    Keyword::TRUE,
    Keyword::FALSE,
    Keyword::INTERVAL,
    Keyword::ESCAPE,
    Keyword::TABLESAMPLE,
    Keyword::PIVOT,
    Keyword::UNPIVOT,
];

fn classify(token: &SqlToken) -> TokenKind {
    match token {
        SqlToken::Word(word) if word.quote_style.is_some() => TokenKind::QuotedName,
        SqlToken::Word(word) if DML_KEYWORDS.contains(&word.keyword) => {
            TokenKind::Dml(word.keyword)
        }
        SqlToken::Word(word) if STRUCTURAL_KEYWORDS.contains(&word.keyword) => {
            TokenKind::Keyword(word.keyword)
        }
        SqlToken::Word(_) => TokenKind::Name,
        SqlToken::Whitespace(
            Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_),
        ) => TokenKind::Comment,
        SqlToken::Whitespace(_) => TokenKind::Whitespace,
        SqlToken::Number(_, _)
        | SqlToken::SingleQuotedString(_)
        | SqlToken::DoubleQuotedString(_)
        | SqlToken::DollarQuotedString(_)
        | SqlToken::NationalStringLiteral(_)
        | SqlToken::EscapedStringLiteral(_)
        | SqlToken::HexStringLiteral(_)
        | SqlToken::SingleQuotedByteStringLiteral(_)
        | SqlToken::DoubleQuotedByteStringLiteral(_) => TokenKind::Literal,
        SqlToken::Comma => TokenKind::Comma,
        SqlToken::Period => TokenKind::Period,
        SqlToken::LParen => TokenKind::LParen,
        SqlToken::RParen => TokenKind::RParen,
        SqlToken::SemiColon => TokenKind::Semicolon,
        SqlToken::Eq
        | SqlToken::Neq
        | SqlToken::Lt
        | SqlToken::Gt
        | SqlToken::LtEq
        | SqlToken::GtEq
        | SqlToken::Plus
        | SqlToken::Minus
        | SqlToken::Mul
        | SqlToken::Div
        | SqlToken::Mod
        | SqlToken::StringConcat => TokenKind::Operator,
        _ => TokenKind::Other,
    }
}
