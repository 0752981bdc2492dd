//! Grouping leaf tokens into a token tree.
//!
//! Parentheses are matched first, then every nesting level is grouped by a
//! fixed sequence of passes, each one folding runs of sibling nodes into a
//! composite node:
//!
//! 1. identifiers: `name`, `a.b.c`, `` `p.d.t` ``
//! 2. functions: identifier directly followed by a parenthesis
//! 3. named subqueries: `identifier AS ( ... )`
//! 4. aliases: `expr AS alias` and `expr alias`
//! 5. identifier lists: comma-separated items
//!
//! Grouping never drops or reorders tokens, so the tree serializes back to
//! the source text.

use sqlparser::keywords::Keyword;

use super::tree::{GroupKind, Node, Token, TokenKind};

/// Build the nodes of one statement from its leaf tokens.
pub(crate) fn build_tree(tokens: Vec<Token>) -> Vec<Node> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];

    for token in tokens {
        match token.kind() {
            TokenKind::LParen => stack.push(vec![Node::Token(token)]),
            TokenKind::RParen if stack.len() > 1 => {
                if let Some(mut children) = stack.pop() {
                    children.push(Node::Token(token));
                    push_node(&mut stack, close_parenthesis(children));
                }
            }
            _ => push_node(&mut stack, Node::Token(token)),
        }
    }

    // Unbalanced input: close whatever is still open.
    while stack.len() > 1 {
        if let Some(children) = stack.pop() {
            push_node(&mut stack, close_parenthesis(children));
        }
    }

    stack.pop().map(group_level).unwrap_or_default()
}

fn push_node(stack: &mut [Vec<Node>], node: Node) {
    if let Some(level) = stack.last_mut() {
        level.push(node);
    }
}

fn close_parenthesis(children: Vec<Node>) -> Node {
    Node::group(GroupKind::Parenthesis, group_level(children))
}

/// Apply all grouping passes to the nodes of a single nesting level.
pub(crate) fn group_level(nodes: Vec<Node>) -> Vec<Node> {
    let nodes = group_identifiers(nodes);
    let nodes = group_functions(nodes);
    let nodes = group_named_subqueries(nodes);
    let nodes = group_aliases(nodes);
    group_identifier_lists(nodes)
}

fn is_kind(node: Option<&Node>, kind: TokenKind) -> bool {
    node.and_then(Node::token_kind) == Some(kind)
}

fn is_name_token(node: Option<&Node>) -> bool {
    node.and_then(Node::as_token).is_some_and(Token::is_name)
}

fn is_star(node: Option<&Node>) -> bool {
    node.and_then(Node::as_token).is_some_and(|t| t.text() == "*")
}

fn is_group(node: Option<&Node>, kind: GroupKind) -> bool {
    node.and_then(Node::group_kind) == Some(kind)
}

/// Index of the next meaningful node at or after `from`.
fn next_meaningful(nodes: &[Node], from: usize) -> Option<usize> {
    (from..nodes.len()).find(|&i| nodes[i].is_meaningful())
}

/// Move `first` and the `count - 1` nodes after it into a new group.
fn fold(
    out: &mut Vec<Node>,
    nodes: &mut std::vec::IntoIter<Node>,
    first: Node,
    count: usize,
    kind: GroupKind,
) {
    let mut children = Vec::with_capacity(count);
    children.push(first);
    children.extend(nodes.by_ref().take(count - 1));
    out.push(Node::group(kind, children));
}

/// Drive a pass: at each position `matcher` may return how many nodes,
/// starting there, form a group of `kind`.
fn run_pass(
    nodes: Vec<Node>,
    kind: GroupKind,
    matcher: impl Fn(&[Node], usize) -> Option<usize>,
) -> Vec<Node> {
    let lengths: Vec<Option<usize>> = {
        let mut lengths = vec![None; nodes.len()];
        let mut i = 0;
        while i < nodes.len() {
            match matcher(&nodes, i) {
                Some(len) if len > 0 => {
                    lengths[i] = Some(len);
                    i += len;
                }
                _ => i += 1,
            }
        }
        lengths
    };

    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter();
    let mut index = 0;
    while let Some(node) = iter.next() {
        match lengths.get(index).copied().flatten() {
            Some(len) => {
                fold(&mut out, &mut iter, node, len, kind);
                index += len;
            }
            None => {
                out.push(node);
                index += 1;
            }
        }
    }
    out
}

fn group_identifiers(nodes: Vec<Node>) -> Vec<Node> {
    run_pass(nodes, GroupKind::Identifier, |nodes, i| {
        if !is_name_token(nodes.get(i)) {
            return None;
        }
        let mut end = i;
        while is_kind(nodes.get(end + 1), TokenKind::Period)
            && (is_name_token(nodes.get(end + 2)) || is_star(nodes.get(end + 2)))
        {
            end += 2;
        }
        Some(end - i + 1)
    })
}

fn group_functions(nodes: Vec<Node>) -> Vec<Node> {
    run_pass(nodes, GroupKind::Function, |nodes, i| {
        (is_group(nodes.get(i), GroupKind::Identifier)
            && is_group(nodes.get(i + 1), GroupKind::Parenthesis))
        .then_some(2)
    })
}

/// Length of `[trivia] AS [trivia]` starting right after `i`, ending on the
/// first meaningful node after AS.
fn as_target(nodes: &[Node], i: usize) -> Option<usize> {
    let as_index = next_meaningful(nodes, i + 1)?;
    let is_as = nodes[as_index]
        .as_token()
        .is_some_and(|t| t.is_keyword(Keyword::AS));
    if !is_as {
        return None;
    }
    next_meaningful(nodes, as_index + 1)
}

fn group_named_subqueries(nodes: Vec<Node>) -> Vec<Node> {
    run_pass(nodes, GroupKind::NamedSubquery, |nodes, i| {
        if !is_group(nodes.get(i), GroupKind::Identifier) {
            return None;
        }
        let body = as_target(nodes, i)?;
        is_group(nodes.get(body), GroupKind::Parenthesis).then(|| body - i + 1)
    })
}

fn is_aliasable(node: &Node) -> bool {
    match node {
        Node::Group(group) => matches!(
            group.kind(),
            GroupKind::Identifier | GroupKind::Function | GroupKind::Parenthesis
        ),
        Node::Token(token) => token.kind() == TokenKind::Literal,
    }
}

fn group_aliases(nodes: Vec<Node>) -> Vec<Node> {
    run_pass(nodes, GroupKind::Aliased, |nodes, i| {
        if !is_aliasable(&nodes[i]) {
            return None;
        }
        if let Some(alias) = as_target(nodes, i) {
            return is_group(nodes.get(alias), GroupKind::Identifier).then(|| alias - i + 1);
        }
        // Implicit alias: `expr alias`, separated by trivia only.
        if nodes[i].as_token().is_some() {
            return None;
        }
        let alias = next_meaningful(nodes, i + 1)?;
        (alias > i + 1 && is_group(nodes.get(alias), GroupKind::Identifier))
            .then(|| alias - i + 1)
    })
}

fn is_list_item(node: &Node) -> bool {
    match node {
        Node::Group(group) => group.kind() != GroupKind::IdentifierList,
        Node::Token(token) => token.kind() == TokenKind::Literal,
    }
}

fn group_identifier_lists(nodes: Vec<Node>) -> Vec<Node> {
    run_pass(nodes, GroupKind::IdentifierList, |nodes, i| {
        if !is_list_item(&nodes[i]) {
            return None;
        }
        let mut end = i;
        while let Some(comma) = next_meaningful(nodes, end + 1) {
            if !is_kind(nodes.get(comma), TokenKind::Comma) {
                break;
            }
            match next_meaningful(nodes, comma + 1) {
                Some(item) if is_list_item(&nodes[item]) => end = item,
                _ => break,
            }
        }
        (end > i).then(|| end - i + 1)
    })
}
