//! Finding marker-prefixed named subqueries.

use std::sync::Arc;

use crate::parser::{Group, GroupKind, Node, Statement};

/// A top-level named subquery whose name carries a marker prefix.
#[derive(Debug, Clone)]
pub struct MarkedBlock {
    group: Arc<Group>,
    name: String,
}

impl MarkedBlock {
    /// Name with backticks removed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier node holding the name exactly as written.
    pub fn name_node(&self) -> Option<&Node> {
        self.group.name_node()
    }

    /// Name exactly as written in the source.
    pub fn declared_name(&self) -> String {
        self.name_node()
            .map(Node::to_string)
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn group(&self) -> &Group {
        &self.group
    }
}

/// Named subqueries at the top of `statement` whose name starts with `prefix`,
/// in document order.
///
/// Only the statement's own nodes and identifier lists are searched; the body
/// of a named subquery is never entered, so blocks nested in another block's
/// body are not reported.
pub fn find_marked(statement: &Statement, prefix: &str) -> Vec<MarkedBlock> {
    let mut found = Vec::new();
    collect(statement.nodes(), prefix, &mut found);
    found
}

/// Whether `statement` declares at least one block with `prefix`.
pub fn has_marked(statement: &Statement, prefix: &str) -> bool {
    !find_marked(statement, prefix).is_empty()
}

fn collect(nodes: &[Node], prefix: &str, found: &mut Vec<MarkedBlock>) {
    for node in nodes {
        let Node::Group(group) = node else {
            continue;
        };
        match group.kind() {
            GroupKind::NamedSubquery => {
                if let Some(name) = group.name() {
                    if !name.is_empty() && name.starts_with(prefix) {
                        found.push(MarkedBlock {
                            group: Arc::clone(group),
                            name,
                        });
                    }
                }
            }
            GroupKind::IdentifierList => collect(group.children(), prefix, found),
            GroupKind::Parenthesis
            | GroupKind::Identifier
            | GroupKind::Function
            | GroupKind::Aliased => {}
        }
    }
}
