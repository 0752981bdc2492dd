//! Replacing qualified table references.
//!
//! A name only counts as a table reference when it sits directly after
//! `FROM` or `JOIN` and is not a member of an identifier list. An aliased
//! name is a list member when its alias wrapper is. The same text used as an
//! alias, a column, or a list entry is left alone.

use sqlparser::keywords::Keyword;

use crate::parser::{EntryId, FlatView, GroupKind, Node, Statement};
use crate::util::strip_backticks;

/// Return a copy of `statement` in which every table reference to `target`
/// reads `replacement`.
///
/// `target` is compared with backticks removed on both sides. When nothing
/// matches, the result serializes exactly like the input.
pub fn replace_table(statement: &Statement, target: &str, replacement: &str) -> Statement {
    replace_table_counted(statement, target, replacement).0
}

/// Like [`replace_table`], also returning how many references were replaced.
pub fn replace_table_counted(
    statement: &Statement,
    target: &str,
    replacement: &str,
) -> (Statement, usize) {
    let paths = find_table_references(statement, target);
    if paths.is_empty() {
        return (statement.clone(), 0);
    }
    let rewritten = statement.replace_paths(&paths, &Node::identifier(replacement));
    (rewritten, paths.len())
}

/// Tree paths of every genuine table reference to `target`, in document order.
pub fn find_table_references(statement: &Statement, target: &str) -> Vec<Vec<usize>> {
    let target = strip_backticks(target);
    let view = FlatView::new(statement);

    view.ids()
        .filter(|&id| {
            let node = view.node(id);
            node.group_kind() == Some(GroupKind::Identifier)
                && node.name().as_deref() == Some(target.as_str())
                && is_table_reference(&view, id)
        })
        .map(|id| view.path(id))
        .collect()
}

/// The table-reference predicate: not an identifier-list member, and the
/// previous meaningful token is `FROM` or `JOIN`.
fn is_table_reference(view: &FlatView<'_>, id: EntryId) -> bool {
    let item = match view.parent(id) {
        Some(parent) if view.node(parent).group_kind() == Some(GroupKind::Aliased) => parent,
        _ => id,
    };
    if view.parent_kind(item) == Some(GroupKind::IdentifierList) {
        return false;
    }
    view.prev_token(id)
        .is_some_and(|token| token.is_keyword(Keyword::FROM) || token.is_keyword(Keyword::JOIN))
}
