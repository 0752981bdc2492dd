//! Flattened, pre-order view of a statement with parent links.
//!
//! Positional predicates ("what keyword precedes this identifier?") need to
//! look across node boundaries: the first token inside a group is preceded by
//! whatever precedes the group itself. [`FlatView`] answers that with plain
//! index arithmetic instead of walking borrowed parent pointers.

use super::tree::{GroupKind, Node, Statement, Token};

/// Identifier of an entry in a [`FlatView`].
pub type EntryId = usize;

#[derive(Debug)]
struct Entry<'a> {
    node: &'a Node,
    parent: Option<EntryId>,
    /// Position among the parent's children (or among the top-level nodes).
    position: usize,
    children: Vec<EntryId>,
}

/// Pre-order list of every node in a statement.
#[derive(Debug)]
pub struct FlatView<'a> {
    entries: Vec<Entry<'a>>,
    roots: Vec<EntryId>,
}

impl<'a> FlatView<'a> {
    pub fn new(statement: &'a Statement) -> Self {
        let mut view = FlatView {
            entries: Vec::new(),
            roots: Vec::new(),
        };
        for (position, node) in statement.nodes().iter().enumerate() {
            let id = view.push(node, None, position);
            view.roots.push(id);
        }
        view
    }

    fn push(&mut self, node: &'a Node, parent: Option<EntryId>, position: usize) -> EntryId {
        let id = self.entries.len();
        self.entries.push(Entry {
            node,
            parent,
            position,
            children: Vec::new(),
        });
        if let Node::Group(group) = node {
            let children: Vec<EntryId> = group
                .children()
                .iter()
                .enumerate()
                .map(|(position, child)| self.push(child, Some(id), position))
                .collect();
            self.entries[id].children = children;
        }
        id
    }

    /// All entry ids in pre-order.
    pub fn ids(&self) -> std::ops::Range<EntryId> {
        0..self.entries.len()
    }

    #[inline]
    pub fn node(&self, id: EntryId) -> &'a Node {
        self.entries[id].node
    }

    #[inline]
    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.entries[id].parent
    }

    /// Kind of the group directly containing `id`, `None` at the top level.
    pub fn parent_kind(&self, id: EntryId) -> Option<GroupKind> {
        self.parent(id).and_then(|p| self.node(p).group_kind())
    }

    fn siblings(&self, id: EntryId) -> &[EntryId] {
        match self.entries[id].parent {
            Some(parent) => &self.entries[parent].children,
            None => &self.roots,
        }
    }

    /// The closest meaningful node before `id`, skipping whitespace and
    /// comments. At the start of a group the search continues before the
    /// group itself, so the result may belong to an enclosing scope.
    pub fn prev_meaningful(&self, id: EntryId) -> Option<EntryId> {
        let mut current = id;
        loop {
            let position = self.entries[current].position;
            let found = self.siblings(current)[..position]
                .iter()
                .rev()
                .copied()
                .find(|&sibling| self.node(sibling).is_meaningful());
            if found.is_some() {
                return found;
            }
            current = self.parent(current)?;
        }
    }

    /// The token before `id` as returned by [`Self::prev_meaningful`], if that
    /// node is a leaf.
    pub fn prev_token(&self, id: EntryId) -> Option<&'a Token> {
        self.prev_meaningful(id)
            .and_then(|prev| self.node(prev).as_token())
    }

    /// Child indices leading from the statement root to `id`.
    pub fn path(&self, id: EntryId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(entry) = current {
            path.push(self.entries[entry].position);
            current = self.entries[entry].parent;
        }
        path.reverse();
        path
    }
}
