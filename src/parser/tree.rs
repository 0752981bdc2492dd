//! Token tree model.
//!
//! A parsed script is a [`Statement`]: an ordered sequence of [`Node`]s, each
//! either a leaf [`Token`] carrying its exact source text or a [`Group`] of
//! child nodes. Trees are immutable; groups sit behind `Arc` so a rewrite
//! only allocates the groups on the path to the changed node and shares
//! everything else with the tree it was derived from.

use std::fmt;
use std::sync::Arc;

use sqlparser::keywords::Keyword;

use crate::util::strip_backticks;

/// Lexical category of a leaf token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// SELECT, INSERT, UPDATE, DELETE or MERGE
    Dml(Keyword),
    /// A structural keyword such as FROM, JOIN, WITH or AS
    Keyword(Keyword),
    /// Unquoted identifier word (including non-structural keywords)
    Name,
    /// Delimited identifier, e.g. `` `project.dataset.table` ``
    QuotedName,
    Literal,
    Comma,
    Period,
    LParen,
    RParen,
    Semicolon,
    Operator,
    Whitespace,
    Comment,
    Other,
}

/// Atomic lexical unit with its exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: Arc<str>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Build an identifier token, quoted if the text carries backticks.
    pub fn identifier(text: &str) -> Self {
        let kind = if text.starts_with('`') {
            TokenKind::QuotedName
        } else {
            TokenKind::Name
        };
        Self::new(kind, text)
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace and comments carry no meaning for grouping or positional checks.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    #[inline]
    pub fn is_dml(&self) -> bool {
        matches!(self.kind, TokenKind::Dml(_))
    }

    #[inline]
    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Name | TokenKind::QuotedName)
    }
}

/// Kind of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// `( ... )`, including both parenthesis tokens
    Parenthesis,
    /// A possibly dotted name: `t`, `d.t`, `` `p.d.t` ``
    Identifier,
    /// An identifier immediately followed by a parenthesis: `count(1)`
    Function,
    /// An expression with an alias: `x AS y`, `` `p.d.t` t ``
    Aliased,
    /// A common table expression: `name AS ( body )`
    NamedSubquery,
    /// Comma-separated sequence of items
    IdentifierList,
}

/// Composite node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    kind: GroupKind,
    children: Vec<Node>,
}

impl Group {
    #[inline]
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Name of an identifier with every backtick removed.
    ///
    /// For an [`GroupKind::Identifier`] this is the dotted name itself; for a
    /// [`GroupKind::NamedSubquery`] it is the name being defined. Other kinds
    /// have no name.
    pub fn name(&self) -> Option<String> {
        match self.kind {
            GroupKind::Identifier => Some(strip_backticks(&self.to_string())),
            GroupKind::NamedSubquery => self.name_node().and_then(Node::name),
            GroupKind::Parenthesis
            | GroupKind::Function
            | GroupKind::Aliased
            | GroupKind::IdentifierList => None,
        }
    }

    /// The identifier node holding the name of a named subquery.
    pub fn name_node(&self) -> Option<&Node> {
        match self.kind {
            GroupKind::NamedSubquery => self
                .children
                .iter()
                .find(|child| child.group_kind() == Some(GroupKind::Identifier)),
            _ => None,
        }
    }

    fn write_to(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for child in &self.children {
            child.write_to(out)?;
        }
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// A node of the token tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    Group(Arc<Group>),
}

impl Node {
    pub fn group(kind: GroupKind, children: Vec<Node>) -> Self {
        Node::Group(Arc::new(Group { kind, children }))
    }

    /// A single-token identifier node reading `text`.
    pub fn identifier(text: &str) -> Self {
        Node::group(
            GroupKind::Identifier,
            vec![Node::Token(Token::identifier(text))],
        )
    }

    #[inline]
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Group(_) => None,
        }
    }

    #[inline]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Token(_) => None,
            Node::Group(group) => Some(group),
        }
    }

    #[inline]
    pub fn group_kind(&self) -> Option<GroupKind> {
        self.as_group().map(Group::kind)
    }

    #[inline]
    pub fn token_kind(&self) -> Option<TokenKind> {
        self.as_token().map(Token::kind)
    }

    /// Anything but whitespace and comments.
    #[inline]
    pub fn is_meaningful(&self) -> bool {
        match self {
            Node::Token(token) => !token.is_trivia(),
            Node::Group(_) => true,
        }
    }

    pub fn name(&self) -> Option<String> {
        self.as_group().and_then(Group::name)
    }

    /// Leaf tokens in document order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![std::slice::from_ref(self).iter()],
        }
    }

    fn write_to(&self, out: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Node::Token(token) => out.write_str(token.text()),
            Node::Group(group) => group.write_to(out),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Depth-first iterator over the leaf tokens below a set of nodes.
pub struct Leaves<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Token(token)) => return Some(token),
                Some(Node::Group(group)) => self.stack.push(group.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Root of a parsed SQL script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    nodes: Arc<[Node]>,
}

impl Statement {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into(),
        }
    }

    /// Top-level nodes.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![self.nodes.iter()],
        }
    }

    /// Index of the first top-level DML keyword token.
    pub fn first_dml_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.as_token().is_some_and(Token::is_dml))
    }

    /// Keep the top-level nodes before `index` and append `tail` in place of the rest.
    pub fn splice_from(&self, index: usize, tail: impl IntoIterator<Item = Node>) -> Statement {
        let keep = index.min(self.nodes.len());
        let nodes: Vec<Node> = self.nodes[..keep].iter().cloned().chain(tail).collect();
        Statement::new(nodes)
    }

    /// Replace the node found at each path (child indices from the root).
    ///
    /// Only the groups along each path are rebuilt; all other subtrees are
    /// shared with `self`.
    pub fn replace_paths(&self, paths: &[Vec<usize>], replacement: &Node) -> Statement {
        let mut nodes = self.nodes.to_vec();
        for path in paths {
            nodes = replace_at(&nodes, path, replacement);
        }
        Statement::new(nodes)
    }
}

fn replace_at(nodes: &[Node], path: &[usize], replacement: &Node) -> Vec<Node> {
    let mut out = nodes.to_vec();
    match path {
        [] => {}
        [index] => {
            if let Some(slot) = out.get_mut(*index) {
                *slot = replacement.clone();
            }
        }
        [index, rest @ ..] => {
            if let Some(Node::Group(group)) = nodes.get(*index) {
                out[*index] = Node::group(
                    group.kind,
                    replace_at(&group.children, rest, replacement),
                );
            }
        }
    }
    out
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.iter() {
            node.write_to(f)?;
        }
        Ok(())
    }
}
