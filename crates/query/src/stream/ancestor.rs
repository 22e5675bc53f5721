//! Ancestor deduplication decorator.
//!
//! In hierarchical stores a document's uid contains the uid of its ancestor
//! as a substring. When a shard matches both, only the ancestor is kept.

use super::{IndexStream, ShardEntry};
use hashbrown::HashMap;
use quarry_core::{EvaluationContext, MatchRecord, NodeId, Result, ShardMatchSet};
use tracing::trace;

/// Wraps a stream and drops matches whose uid contains the uid of another
/// match for the same predicate node in the same shard.
///
/// Context, node and `has_next` pass through to the delegate unchanged.
#[derive(Debug)]
pub struct AncestorIndexStream<S> {
    delegate: S,
    parent: Option<NodeId>,
    pending: Option<ShardEntry>,
}

impl<S: IndexStream> AncestorIndexStream<S> {
    /// Wraps `delegate` with no parent node.
    pub fn new(delegate: S) -> Self {
        Self {
            delegate,
            parent: None,
            pending: None,
        }
    }

    /// Wraps `delegate` and records the node it hangs under.
    pub fn with_parent(delegate: S, parent: NodeId) -> Self {
        Self {
            delegate,
            parent: Some(parent),
            pending: None,
        }
    }

    /// Returns the node this stream hangs under, if one was given.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Unwraps the decorator, returning the delegate.
    pub fn into_inner(self) -> S {
        self.delegate
    }
}

/// Removes descendant matches from `set`.
///
/// Records are grouped by node. Within a group a record is rejected if its
/// uid contains the uid of a record already accepted, visiting records in
/// uid order. The shard, node and infinite flag are preserved.
pub fn remove_overlapping(set: &ShardMatchSet) -> ShardMatchSet {
    let mut groups: HashMap<Option<NodeId>, Vec<&MatchRecord>> = HashMap::new();
    for record in set.matches() {
        let accepted = groups.entry(record.node()).or_default();
        if let Some(ancestor) = accepted.iter().find(|a| record.uid().contains(a.uid())) {
            trace!(
                shard = set.shard_id(),
                uid = record.uid(),
                ancestor = ancestor.uid(),
                "dropping descendant match"
            );
            continue;
        }
        accepted.push(record);
    }

    let mut out = ShardMatchSet::new(set.shard_id(), set.node());
    if set.is_infinite() {
        out.mark_infinite();
    }
    for record in groups.into_values().flatten() {
        out.insert(record.clone());
    }
    out
}

impl<S: IndexStream> IndexStream for AncestorIndexStream<S> {
    fn context(&self) -> EvaluationContext {
        self.delegate.context()
    }

    fn current_node(&self) -> Option<NodeId> {
        self.delegate.current_node()
    }

    fn can_prune(&self) -> bool {
        self.delegate.can_prune()
    }

    fn deferred_nodes(&self) -> Vec<NodeId> {
        self.delegate.deferred_nodes()
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        self.delegate.has_next()
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        if self.pending.is_none() {
            let (shard, set) = self.delegate.peek()?;
            let entry = (shard.clone(), remove_overlapping(set));
            self.pending = Some(entry);
        }
        match &self.pending {
            Some(entry) => Ok(entry),
            None => self.delegate.peek(),
        }
    }

    fn next(&mut self) -> Result<ShardEntry> {
        let (shard, set) = self.delegate.next()?;
        if let Some(entry) = self.pending.take() {
            return Ok(entry);
        }
        Ok((shard, remove_overlapping(&set)))
    }

    fn remove(&mut self) -> Result<()> {
        self.delegate.remove()
    }

    fn debug_trace(&self) -> String {
        format!("Ancestor({})", self.delegate.debug_trace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{drain, LeafStream};
    use quarry_core::Error;

    fn set(shard: &str, node: Option<NodeId>, uids: &[&str]) -> ShardMatchSet {
        ShardMatchSet::from_uids(shard, node, uids.iter().copied())
    }

    #[test]
    fn test_descendants_removed() {
        let node = Some(NodeId::new(0));
        let input = set("20240101_3", node, &["a.1", "a.1.x", "a.1.y", "b.2"]);

        let out = remove_overlapping(&input);
        assert_eq!(out.uids().collect::<Vec<_>>(), vec!["a.1", "b.2"]);
        assert_eq!(out.shard_id(), "20240101_3");
        assert_eq!(out.node(), node);
    }

    #[test]
    fn test_groups_are_independent() {
        let mut input = ShardMatchSet::new("S1", None);
        input.insert(MatchRecord::new("a.1", Some(NodeId::new(0))));
        input.insert(MatchRecord::new("a.1.x", Some(NodeId::new(1))));

        let out = remove_overlapping(&input);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_infinite_flag_preserved() {
        let mut input = set("S1", None, &["a", "ab"]);
        input.mark_infinite();

        let out = remove_overlapping(&input);
        assert!(out.is_infinite());
        assert_eq!(out.uids().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_idempotent() {
        let input = set("S1", None, &["a", "a.b", "a.b.c", "c", "x.c", "y"]);
        let once = remove_overlapping(&input);
        let twice = remove_overlapping(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stream_peek_matches_next() {
        let node = Some(NodeId::new(2));
        let leaf = LeafStream::new(
            node,
            vec![set("S1", node, &["p", "p.q"]), set("S2", node, &["r"])],
        )
        .unwrap();
        let mut stream = AncestorIndexStream::with_parent(leaf, NodeId::new(9));

        assert_eq!(stream.context(), EvaluationContext::Present);
        assert_eq!(stream.current_node(), node);
        assert_eq!(stream.parent(), Some(NodeId::new(9)));

        let peeked = stream.peek().unwrap().clone();
        assert_eq!(stream.peek().unwrap(), &peeked);
        assert_eq!(stream.next().unwrap(), peeked);
        assert_eq!(peeked.1.uids().collect::<Vec<_>>(), vec!["p"]);

        let rest = drain(&mut stream).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].0, "S2");
        assert!(!stream.has_next().unwrap());
        assert!(matches!(stream.peek(), Err(Error::IllegalState { .. })));
    }

    #[test]
    fn test_remove_delegates() {
        let mut stream = AncestorIndexStream::new(LeafStream::delayed(None));
        assert!(matches!(stream.remove(), Err(Error::UnsupportedOperation { .. })));
        assert_eq!(stream.debug_trace(), "Ancestor(Leaf[DELAYED](<no node>))");
        assert!(!stream.can_prune());
        assert!(stream.deferred_nodes().is_empty());
    }
}
