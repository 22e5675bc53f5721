//! Predicate tree for index lookups.
//!
//! The tree is an arena of tagged nodes. Children are always created before
//! their parent, so every `NodeId` handed out refers to an existing node and
//! the tree cannot contain cycles.

use quarry_core::{Error, NodeId, Result};
use std::collections::BTreeSet;

/// The kind of a predicate node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// `field == value`, answered by a leaf index scan.
    Term { field: String, value: String },
    /// Conjunction of the children.
    And(Vec<NodeId>),
    /// Disjunction of the children.
    Or(Vec<NodeId>),
    /// Negation; never answered from the index.
    Not(NodeId),
    /// Subtree explicitly deferred to document evaluation.
    Delayed(NodeId),
}

/// A node of the predicate tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateNode {
    id: NodeId,
    kind: NodeKind,
}

impl PredicateNode {
    /// Returns this node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns this node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the direct children of this node.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Term { .. } => &[],
            NodeKind::And(children) | NodeKind::Or(children) => children.as_slice(),
            NodeKind::Not(child) | NodeKind::Delayed(child) => core::slice::from_ref(child),
        }
    }
}

/// Arena-backed predicate tree.
#[derive(Clone, Debug, Default)]
pub struct PredicateTree {
    nodes: Vec<PredicateNode>,
    root: Option<NodeId>,
}

impl PredicateTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `field == value` term.
    pub fn term(&mut self, field: impl Into<String>, value: impl Into<String>) -> Result<NodeId> {
        self.push(NodeKind::Term {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Adds a conjunction over existing nodes.
    pub fn and(&mut self, children: impl IntoIterator<Item = NodeId>) -> Result<NodeId> {
        let children = self.checked_children(children)?;
        self.push(NodeKind::And(children))
    }

    /// Adds a disjunction over existing nodes.
    pub fn or(&mut self, children: impl IntoIterator<Item = NodeId>) -> Result<NodeId> {
        let children = self.checked_children(children)?;
        self.push(NodeKind::Or(children))
    }

    /// Adds a negation of an existing node.
    pub fn not(&mut self, child: NodeId) -> Result<NodeId> {
        self.check(child)?;
        self.push(NodeKind::Not(child))
    }

    /// Marks an existing subtree for document-level evaluation.
    pub fn delayed(&mut self, child: NodeId) -> Result<NodeId> {
        self.check(child)?;
        self.push(NodeKind::Delayed(child))
    }

    /// Sets the root node.
    pub fn set_root(&mut self, root: NodeId) -> Result<()> {
        self.check(root)?;
        self.root = Some(root);
        Ok(())
    }

    /// Returns the root node, if one was set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node for `id`.
    pub fn node(&self, id: NodeId) -> Option<&PredicateNode> {
        self.nodes.get(id.index())
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the depth of the subtree at `id` (a term has depth 1).
    pub fn depth(&self, id: NodeId) -> usize {
        self.node(id)
            .map(|node| 1 + node.children().iter().map(|c| self.depth(*c)).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Returns the fields referenced by terms under `id`.
    pub fn fields(&self, id: NodeId) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            if let NodeKind::Term { field, .. } = &node.kind {
                fields.insert(field.as_str());
            }
            pending.extend_from_slice(node.children());
        }
        fields
    }

    /// Renders the subtree at `id` in a compact infix form for debug traces.
    pub fn describe(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return format!("<missing {id}>");
        };
        match &node.kind {
            NodeKind::Term { field, value } => format!("{field} == '{value}'"),
            NodeKind::And(children) => self.describe_joined(children, " && "),
            NodeKind::Or(children) => self.describe_joined(children, " || "),
            NodeKind::Not(child) => format!("!({})", self.describe(*child)),
            NodeKind::Delayed(child) => format!("delayed({})", self.describe(*child)),
        }
    }

    fn describe_joined(&self, children: &[NodeId], op: &str) -> String {
        let parts: Vec<_> = children.iter().map(|c| self.describe(*c)).collect();
        format!("({})", parts.join(op))
    }

    fn push(&mut self, kind: NodeKind) -> Result<NodeId> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(PredicateNode { id, kind });
        Ok(id)
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!("unknown predicate node {id}")))
        }
    }

    fn checked_children(&self, children: impl IntoIterator<Item = NodeId>) -> Result<Vec<NodeId>> {
        let children: Vec<_> = children.into_iter().collect();
        for child in &children {
            self.check(*child)?;
        }
        Ok(children)
    }
}

/// Id for the node stored at `len`; ids must fit in a `u32`.
fn next_id(len: usize) -> Result<NodeId> {
    u32::try_from(len)
        .map(NodeId::new)
        .map_err(|_| Error::invalid_argument(format!("predicate tree is full at {len} nodes")))
}
