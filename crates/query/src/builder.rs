//! Stream tree construction.
//!
//! Walks a `PredicateTree` bottom-up and assembles the matching stream tree:
//! terms become leaves from a `LeafSource`, AND nodes become
//! intersections, OR nodes become unions, and negated or delayed subtrees
//! become delayed leaves for the document evaluator.

use crate::ast::{NodeKind, PredicateTree};
use crate::stream::{AncestorIndexStream, BoxedStream, Intersection, LeafStream, Union};
use quarry_core::{EngineConfig, Error, NodeId, Result};
use tracing::debug;

/// Supplies leaf streams for term nodes.
pub trait LeafSource<'a> {
    /// Opens a leaf stream for `field == value`, attributed to `node`.
    fn scan(&mut self, node: NodeId, field: &str, value: &str) -> Result<BoxedStream<'a>>;
}

impl<'a, F> LeafSource<'a> for F
where
    F: FnMut(NodeId, &str, &str) -> Result<BoxedStream<'a>>,
{
    fn scan(&mut self, node: NodeId, field: &str, value: &str) -> Result<BoxedStream<'a>> {
        self(node, field, value)
    }
}

/// Builds stream trees for one predicate tree.
#[derive(Debug, Clone)]
pub struct StreamBuilder<'t> {
    tree: &'t PredicateTree,
    config: EngineConfig,
}

impl<'t> StreamBuilder<'t> {
    /// Creates a builder for `tree` under `config`.
    pub fn new(tree: &'t PredicateTree, config: EngineConfig) -> Self {
        Self { tree, config }
    }

    /// Returns the settings streams are built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the stream for the tree's root.
    pub fn build<'a, S>(&self, source: &mut S) -> Result<BoxedStream<'a>>
    where
        S: LeafSource<'a>,
    {
        self.config.validate()?;
        let root = self
            .tree
            .root()
            .ok_or_else(|| Error::invalid_argument("predicate tree has no root"))?;
        let stream = self.build_node(root, source)?;
        let stream: BoxedStream<'a> = if self.config.ancestor_dedup {
            Box::new(AncestorIndexStream::new(stream))
        } else {
            stream
        };
        debug!(
            query = %self.tree.describe(root),
            context = %stream.context(),
            "built stream tree"
        );
        Ok(stream)
    }

    /// Builds the stream for the subtree at `id`.
    pub fn build_node<'a, S>(&self, id: NodeId, source: &mut S) -> Result<BoxedStream<'a>>
    where
        S: LeafSource<'a>,
    {
        let node = self
            .tree
            .node(id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown predicate node {id}")))?;

        match node.kind() {
            NodeKind::Term { field, value } => source.scan(id, field, value),
            NodeKind::And(children) => {
                let mut streams = self.build_children(id, children, source)?;
                if streams.len() == 1 {
                    return Ok(streams.remove(0));
                }
                Ok(Box::new(Intersection::new(Some(id), streams)?))
            }
            NodeKind::Or(children) => {
                let mut streams = self.build_children(id, children, source)?;
                if streams.len() == 1 {
                    return Ok(streams.remove(0));
                }
                Ok(Box::new(Union::new(Some(id), streams)?))
            }
            NodeKind::Not(_) | NodeKind::Delayed(_) => Ok(Box::new(
                LeafStream::delayed(Some(id)).with_label(self.tree.describe(id)),
            )),
        }
    }

    fn build_children<'a, S>(
        &self,
        id: NodeId,
        children: &[NodeId],
        source: &mut S,
    ) -> Result<Vec<BoxedStream<'a>>>
    where
        S: LeafSource<'a>,
    {
        if children.is_empty() {
            return Err(Error::invalid_argument(format!(
                "composite node {id} has no children"
            )));
        }
        children
            .iter()
            .map(|child| self.build_node(*child, source))
            .collect()
    }
}
