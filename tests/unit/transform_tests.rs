//! Unit tests for marker scanning, table rewriting, mocking and check
//! query synthesis

use pretty_assertions::assert_eq;

use sqlcheck::config::{CheckOptions, CheckTemplate};
use sqlcheck::parser::parse_statement;
use sqlcheck::transform::{
    apply_mocks, demangle, find_marked, find_mocks, has_marked, replace_table, resolve_mocks,
    synthesize, CheckQuery, CheckSynthesizer, MockTable, TransformDiagnostic,
};

const TESTABLE: &str = "WITH test as (
    select 1 as label
    from `project.dataset.table`
    group by label
    order by 1 desc
)
, __check as (
    select \"test\" as label, count(1) as actual, 1 as expected from test
)
SELECT * FROM report";

const MOCKABLE: &str = "WITH
__mock___project___dataset___table as (
    select \"test\" as label, 1 as actual, 1 as expected from test
),
test as (
    select 1 as label
    from `project.dataset.table`
    group by label
    order by 1 desc
)
SELECT * FROM report";

const NON_TESTABLE: &str = "
    WITH test as (
        select 1
    )

    SELECT * FROM report
    ";

// ============================================================================
// Marker Scanner Tests
// ============================================================================

#[test]
fn test_has_check_block() {
    let stmt = parse_statement(TESTABLE).unwrap();
    assert!(has_marked(&stmt, "__check"));
}

#[test]
fn test_has_no_check_block() {
    let stmt = parse_statement(NON_TESTABLE).unwrap();
    assert!(!has_marked(&stmt, "__check"));
}

#[test]
fn test_find_check_blocks() {
    let stmt = parse_statement(TESTABLE).unwrap();
    let blocks = find_marked(&stmt, "__check");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), "__check");
}

#[test]
fn test_marker_prefix_is_case_sensitive() {
    let stmt = parse_statement("WITH __CHECK AS (SELECT 1) SELECT 2").unwrap();
    assert!(!has_marked(&stmt, "__check"));
}

#[test]
fn test_custom_check_prefix() {
    let stmt =
        parse_statement("WITH assert_totals AS (SELECT 1), __check AS (SELECT 2) SELECT 3")
            .unwrap();
    let names: Vec<String> = find_marked(&stmt, "assert_")
        .iter()
        .map(|b| b.name().to_string())
        .collect();
    assert_eq!(names, vec!["assert_totals"]);
}

// ============================================================================
// Reference Rewriter Tests
// ============================================================================

#[test]
fn test_replace_table_with() {
    let stmt = parse_statement(TESTABLE).unwrap();
    let actual = replace_table(&stmt, "project.dataset.table", "fixture_table");
    assert_eq!(
        actual.to_string(),
        TESTABLE.replace("`project.dataset.table`", "fixture_table")
    );
}

#[test]
fn test_replace_table_accepts_quoted_target() {
    let stmt = parse_statement("SELECT * FROM p.d.t").unwrap();
    assert_eq!(
        replace_table(&stmt, "`p.d.t`", "fixture").to_string(),
        "SELECT * FROM fixture"
    );
}

#[test]
fn test_replace_table_per_part_quoting() {
    let stmt = parse_statement("SELECT * FROM `p`.`d`.`t` JOIN `p.d.t` USING (id)").unwrap();
    assert_eq!(
        replace_table(&stmt, "p.d.t", "m").to_string(),
        "SELECT * FROM m JOIN m USING (id)"
    );
}

#[test]
fn test_replace_table_is_idempotent_noop_without_match() {
    let stmt = parse_statement(TESTABLE).unwrap();
    let actual = replace_table(&stmt, "other.dataset.table", "x");
    assert_eq!(actual.to_string(), TESTABLE);
}

#[test]
fn test_replace_table_leaves_alias_use_alone() {
    let sql = "SELECT `p.d.t`.x AS `p.d.t` FROM src";
    let stmt = parse_statement(sql).unwrap();
    assert_eq!(replace_table(&stmt, "p.d.t", "m").to_string(), sql);
}

#[test]
fn test_replace_table_in_nested_subquery() {
    let stmt = parse_statement("SELECT * FROM (SELECT * FROM (SELECT a FROM `p.d.t`))").unwrap();
    assert_eq!(
        replace_table(&stmt, "p.d.t", "m").to_string(),
        "SELECT * FROM (SELECT * FROM (SELECT a FROM m))"
    );
}

// ============================================================================
// Mock Resolver Tests
// ============================================================================

#[test]
fn test_generate_mocked_sql() {
    let stmt = parse_statement(MOCKABLE).unwrap();
    let expected = MOCKABLE.replace(
        "from `project.dataset.table`",
        "from __mock___project___dataset___table",
    );
    assert_eq!(
        apply_mocks(&stmt, &CheckOptions::default()).to_string(),
        expected
    );
}

#[test]
fn test_find_mocks() {
    let stmt = parse_statement(MOCKABLE).unwrap();
    assert_eq!(
        find_mocks(&stmt, "__mock__"),
        vec![MockTable {
            name: "__mock___project___dataset___table".to_string(),
            target: "project.dataset.table".to_string(),
        }]
    );
}

#[test]
fn test_demangle_forms() {
    assert_eq!(demangle("__mock__p__d__t", "__mock__"), "p.d.t");
    assert_eq!(demangle("__mock___p___d___t", "__mock__"), "p.d.t");
    assert_eq!(demangle("fx__p__d__t", "fx__"), "p.d.t");
}

#[test]
fn test_mock_with_custom_prefix() {
    let sql = "WITH fixture__p__d__t AS (SELECT 1 AS a) SELECT a FROM `p.d.t`";
    let options = CheckOptions {
        mock_prefix: "fixture__".to_string(),
        ..CheckOptions::default()
    };
    let stmt = parse_statement(sql).unwrap();
    assert_eq!(
        apply_mocks(&stmt, &options).to_string(),
        "WITH fixture__p__d__t AS (SELECT 1 AS a) SELECT a FROM fixture__p__d__t"
    );
}

#[test]
fn test_unused_mock_produces_diagnostic() {
    let stmt = parse_statement("WITH __mock__a__b AS (SELECT 1) SELECT * FROM c").unwrap();
    let resolution = resolve_mocks(&stmt, &CheckOptions::default());
    assert_eq!(resolution.statement.to_string(), stmt.to_string());
    assert_eq!(
        resolution.diagnostics,
        vec![TransformDiagnostic::RewriteNoOp {
            mock: "__mock__a__b".to_string(),
            target: "a.b".to_string(),
        }]
    );
}

// ============================================================================
// Check Query Synthesizer Tests
// ============================================================================

#[test]
fn test_generate_sql_for_checks() {
    let stmt = parse_statement(TESTABLE).unwrap();
    let actual: Vec<CheckQuery> = synthesize(&stmt).unwrap().collect();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].label, "check");

    let expected = TESTABLE.replace(
        "SELECT * FROM report",
        "select\n  label, countif(actual != expected) as errors\nfrom __check\ngroup by label",
    );
    assert_eq!(actual[0].sql(), expected);
}

#[test]
fn test_generate_sql_for_checks_count_where_template() {
    let options = CheckOptions {
        template: CheckTemplate::CountWhere,
        limit: Some(100),
        ..CheckOptions::default()
    };
    let stmt = parse_statement(TESTABLE).unwrap();
    let actual: Vec<CheckQuery> = CheckSynthesizer::new(&options)
        .unwrap()
        .synthesize(&stmt)
        .collect();

    let expected = TESTABLE.replace(
        "SELECT * FROM report",
        "select\n  label, count(1) as errors\nfrom __check\nwhere actual != expected\ngroup by label\nlimit 100",
    );
    assert_eq!(actual[0].sql(), expected);
}

#[test]
fn test_generate_sql_for_no_sql() {
    let stmt = parse_statement("\n    ").unwrap();
    assert_eq!(synthesize(&stmt).unwrap().count(), 0);
}

#[test]
fn test_generate_sql_without_check_blocks() {
    let stmt = parse_statement(MOCKABLE).unwrap();
    let checks = synthesize(&stmt).unwrap();
    assert!(checks.diagnostics().is_empty());
    assert_eq!(checks.count(), 0);
}

#[test]
fn test_synthesis_does_not_modify_input() {
    let stmt = parse_statement(TESTABLE).unwrap();
    let _: Vec<CheckQuery> = synthesize(&stmt).unwrap().collect();
    assert_eq!(stmt.to_string(), TESTABLE);
}

#[test]
fn test_check_with_mock_references_mock() {
    let sql = "WITH __mock__p__d__t AS (SELECT 2 AS n),
__check_n AS (SELECT 'n' AS label, n AS actual, 2 AS expected FROM `p.d.t`)
SELECT * FROM `p.d.t`";
    let stmt = parse_statement(sql).unwrap();
    let check = synthesize(&stmt).unwrap().next().unwrap();
    assert_eq!(check.label, "check_n");
    assert_eq!(
        check.sql(),
        "WITH __mock__p__d__t AS (SELECT 2 AS n),
__check_n AS (SELECT 'n' AS label, n AS actual, 2 AS expected FROM __mock__p__d__t)
select
  label, countif(actual != expected) as errors
from __check_n
group by label"
    );
}

#[test]
fn test_synthesizer_with_unknown_dialect_fails() {
    let options = CheckOptions {
        dialect: "nope".to_string(),
        ..CheckOptions::default()
    };
    assert!(CheckSynthesizer::new(&options).is_err());
}

#[test]
fn test_quoted_check_block_label() {
    let sql = "WITH `__check_q` AS (SELECT 'a' AS label, 1 AS actual, 1 AS expected) SELECT 1";
    let stmt = parse_statement(sql).unwrap();
    let checks: Vec<CheckQuery> = synthesize(&stmt).unwrap().collect();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].label, "check_q");
    assert_eq!(checks[0].name, "`__check_q`");
}
