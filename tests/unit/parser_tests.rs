//! Unit tests for the SQL token tree
//!
//! Parsing must be lossless: every statement re-serializes to exactly the
//! text it was parsed from.

use pretty_assertions::assert_eq;

use sqlcheck::parser::{
    parse_statement, parse_statement_with, resolve_dialect, tokenize, FlatView, GroupKind, Node,
    TokenKind,
};
use sqlcheck::SqlCheckError;

fn top_level_kinds(sql: &str) -> Vec<GroupKind> {
    parse_statement(sql)
        .unwrap()
        .nodes()
        .iter()
        .filter_map(Node::group_kind)
        .collect()
}

// ============================================================================
// Lossless Round-Trip Tests
// ============================================================================

#[test]
fn test_round_trip_cte_statement() {
    let sql = "WITH a AS (\n  SELECT x, y -- why\n  FROM `p.d.t`\n)\nSELECT * FROM a\n";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_round_trip_preserves_odd_spacing_and_case() {
    let sql = "sElEcT\t*   FrOm\r\n  `p`.`d`.`t`   wHeRe  a<>b  /* c */";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_round_trip_string_literals() {
    let sql = "SELECT 'single', \"double\", 42, 1.5e3 FROM t";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_round_trip_unicode() {
    let sql = "SELECT 'ラベル' AS label, '🚀' AS emoji FROM t";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_round_trip_with_other_dialect() {
    let dialect = resolve_dialect("generic").unwrap();
    let sql = "SELECT \"a\".\"b\" FROM s.t";
    assert_eq!(
        parse_statement_with(sql, dialect.as_ref()).unwrap().to_string(),
        sql
    );
}

// ============================================================================
// Statement Boundary Tests
// ============================================================================

#[test]
fn test_only_first_statement_is_kept() {
    let stmt = parse_statement("SELECT 1;\nSELECT 2").unwrap();
    assert_eq!(stmt.to_string(), "SELECT 1;");
}

#[test]
fn test_trailing_trivia_after_semicolon_is_kept() {
    let sql = "SELECT 1;\n-- done\n";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_semicolon_inside_parentheses_does_not_split() {
    let sql = "SELECT (SELECT 1;) AS x";
    assert_eq!(parse_statement(sql).unwrap().to_string(), sql);
}

#[test]
fn test_empty_input_is_empty_statement_error() {
    assert!(matches!(
        parse_statement(""),
        Err(SqlCheckError::EmptyStatement)
    ));
}

#[test]
fn test_whitespace_only_input_parses() {
    let stmt = parse_statement("\n    \n").unwrap();
    assert_eq!(stmt.first_dml_index(), None);
}

#[test]
fn test_unterminated_string_is_parse_error() {
    let err = parse_statement("SELECT 'oops").unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {:?}", err);
}

// ============================================================================
// Token Classification Tests
// ============================================================================

#[test]
fn test_token_kinds() {
    let dialect = resolve_dialect("bigquery").unwrap();
    let tokens = tokenize("SELECT a, `b` FROM t;", dialect.as_ref()).unwrap();
    let kinds: Vec<TokenKind> = tokens
        .iter()
        .filter(|t| !t.is_trivia())
        .map(|t| t.kind())
        .collect();

    assert!(matches!(kinds[0], TokenKind::Dml(_)));
    assert_eq!(kinds[1], TokenKind::Name);
    assert_eq!(kinds[2], TokenKind::Comma);
    assert_eq!(kinds[3], TokenKind::QuotedName);
    assert!(matches!(kinds[4], TokenKind::Keyword(_)));
    assert_eq!(kinds[5], TokenKind::Name);
    assert_eq!(kinds[6], TokenKind::Semicolon);
}

#[test]
fn test_unknown_dialect() {
    assert!(matches!(
        resolve_dialect("cobol"),
        Err(SqlCheckError::UnknownDialect { .. })
    ));
}

// ============================================================================
// Grouping Tests
// ============================================================================

#[test]
fn test_cte_list_is_identifier_list_of_named_subqueries() {
    let stmt = parse_statement("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT 3").unwrap();
    let list = stmt
        .nodes()
        .iter()
        .find(|n| n.group_kind() == Some(GroupKind::IdentifierList))
        .expect("identifier list");

    let names: Vec<String> = list
        .as_group()
        .unwrap()
        .children()
        .iter()
        .filter(|n| n.group_kind() == Some(GroupKind::NamedSubquery))
        .filter_map(Node::name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_single_cte_is_named_subquery() {
    assert!(top_level_kinds("WITH a AS (SELECT 1) SELECT 2").contains(&GroupKind::NamedSubquery));
}

#[test]
fn test_quoted_dotted_identifier_name() {
    let stmt = parse_statement("SELECT * FROM `p`.`d`.`t`").unwrap();
    let ident = stmt
        .nodes()
        .iter()
        .rev()
        .find(|n| n.group_kind() == Some(GroupKind::Identifier))
        .unwrap();
    assert_eq!(ident.name().as_deref(), Some("p.d.t"));
    assert_eq!(ident.to_string(), "`p`.`d`.`t`");
}

// ============================================================================
// Cursor Tests
// ============================================================================

#[test]
fn test_previous_meaningful_token_crosses_scopes() {
    let stmt = parse_statement("SELECT * FROM\n  -- note\n  (SELECT 1)").unwrap();
    let view = FlatView::new(&stmt);

    let inner_select = view
        .ids()
        .filter(|&id| {
            view.node(id)
                .as_token()
                .is_some_and(|t| t.is_dml())
        })
        .nth(1)
        .expect("inner SELECT");

    let prev = view.prev_token(inner_select).unwrap();
    assert_eq!(prev.text(), "(");

    let paren = view.parent(inner_select).unwrap();
    assert_eq!(view.prev_token(paren).unwrap().text(), "FROM");
}
