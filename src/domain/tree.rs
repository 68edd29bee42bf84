//! Traversal over filter trees: node paths, pre-order iteration, lookups.

use std::fmt;

use tracing::instrument;

use crate::domain::entities::{Condition, ConditionGroup, FilterItem, FilterValue, NodeKey};

/// Index path from the root to a node. The root itself has an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of edges from the root.
    pub fn level(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Borrowed view of any node in a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Root(&'a FilterValue),
    Group(&'a ConditionGroup),
    Condition(&'a Condition),
}

impl<'a> NodeRef<'a> {
    pub fn key(&self) -> Option<&'a NodeKey> {
        match self {
            NodeRef::Root(_) => None,
            NodeRef::Group(g) => Some(&g.key),
            NodeRef::Condition(c) => Some(&c.key),
        }
    }

    pub fn group_name(&self) -> Option<&'a str> {
        match self {
            NodeRef::Root(r) => Some(&r.group_name),
            NodeRef::Group(g) => Some(&g.group_name),
            NodeRef::Condition(_) => None,
        }
    }

    pub fn items(&self) -> &'a [FilterItem] {
        match self {
            NodeRef::Root(r) => &r.items,
            NodeRef::Group(g) => &g.items,
            NodeRef::Condition(_) => &[],
        }
    }

    pub fn as_condition(&self) -> Option<&'a Condition> {
        match self {
            NodeRef::Condition(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        !matches!(self, NodeRef::Condition(_))
    }
}

impl<'a> From<&'a FilterItem> for NodeRef<'a> {
    fn from(item: &'a FilterItem) -> Self {
        match item {
            FilterItem::Group(g) => NodeRef::Group(g),
            FilterItem::Condition(c) => NodeRef::Condition(c),
        }
    }
}

/// Pre-order, left-to-right iterator starting at the root.
pub struct TreeIterator<'a> {
    stack: Vec<(NodePath, NodeRef<'a>)>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FilterValue) -> Self {
        Self {
            stack: vec![(NodePath::root(), NodeRef::Root(tree))],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodePath, NodeRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for (index, child) in node.items().iter().enumerate().rev() {
            self.stack.push((path.child(index), NodeRef::from(child)));
        }
        Some((path, node))
    }
}

impl FilterValue {
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of nodes on the longest root-to-node path; a bare root has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter()
            .map(|(path, _)| path.level() + 1)
            .max()
            .unwrap_or(1)
    }

    /// Number of nodes below the root.
    pub fn len(&self) -> usize {
        self.iter().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All leaf conditions in display order.
    pub fn conditions(&self) -> Vec<(NodePath, &Condition)> {
        self.iter()
            .filter_map(|(path, node)| node.as_condition().map(|c| (path, c)))
            .collect()
    }

    pub fn keys(&self) -> Vec<&NodeKey> {
        self.iter().filter_map(|(_, node)| node.key()).collect()
    }

    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.iter().any(|(_, node)| node.key() == Some(key))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, key: &NodeKey) -> Option<(NodePath, NodeRef<'_>)> {
        self.iter().find(|(_, node)| node.key() == Some(key))
    }

    pub fn get(&self, path: &NodePath) -> Option<NodeRef<'_>> {
        let mut node = NodeRef::Root(self);
        for &index in path.indices() {
            node = NodeRef::from(node.items().get(index)?);
        }
        Some(node)
    }

    /// One past the largest non-negative integer key; other keys are ignored.
    ///
    /// `None` once the largest key is `u64::MAX`.
    pub fn next_numeric_key(&self) -> Option<NodeKey> {
        let max = self
            .keys()
            .into_iter()
            .filter_map(NodeKey::as_u64)
            .max()
            .unwrap_or(0);
        max.checked_add(1).map(NodeKey::from)
    }
}

impl<'a> IntoIterator for &'a FilterValue {
    type Item = (NodePath, NodeRef<'a>);
    type IntoIter = TreeIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
