//! Union of index streams (OR).

use super::{exhausted, BoxedStream, IndexStream, Lookahead, ShardEntry};
use quarry_core::{Error, EvaluationContext, NodeId, Result, ShardMatchSet};
use tracing::{debug, trace};

const KIND: &str = "union";

/// Merge of two or more streams under OR semantics.
///
/// Emits every shard any child holds, in ascending order. When several
/// children hold the same shard their matches are merged; the leftmost
/// child's record wins for a duplicate uid. `Absent` children are dropped.
/// Deferred children are still pulled: a deferred leaf yields nothing, but a
/// deferred composite can carry shards.
pub struct Union<'a> {
    node: Option<NodeId>,
    context: EvaluationContext,
    sources: Vec<BoxedStream<'a>>,
    prunes: bool,
    lookahead: Lookahead,
}

impl<'a> Union<'a> {
    /// Builds the union of `children` for the OR node `node`.
    ///
    /// Fails with `InvalidArgument` for fewer than two children.
    pub fn new(node: Option<NodeId>, children: Vec<BoxedStream<'a>>) -> Result<Self> {
        if children.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "union requires at least two children, got {}",
                children.len()
            )));
        }

        let total = children.len();
        let sources: Vec<_> = children
            .into_iter()
            .filter(|c| c.context() != EvaluationContext::Absent)
            .collect();
        let context = EvaluationContext::weakest(sources.iter().map(|c| c.context()))
            .unwrap_or(EvaluationContext::Absent);
        let prunes = !sources.is_empty() && sources.iter().all(|c| c.can_prune());

        let mut lookahead = Lookahead::default();
        if sources.is_empty() {
            lookahead.finish();
        }

        debug!(
            node = ?node,
            context = %context,
            sources = sources.len(),
            dropped = total - sources.len(),
            prunes,
            "built union"
        );
        Ok(Self {
            node,
            context,
            sources,
            prunes,
            lookahead,
        })
    }
}

/// Pulls every source positioned at the lowest pending shard and merges
/// their sets.
fn advance(sources: &mut [BoxedStream<'_>], node: Option<NodeId>) -> Result<Option<ShardEntry>> {
    loop {
        let mut target: Option<String> = None;
        for child in sources.iter_mut() {
            if !child.has_next()? {
                continue;
            }
            let shard = &child.peek()?.0;
            if target.as_deref().map_or(true, |t| shard.as_str() < t) {
                target = Some(shard.clone());
            }
        }
        let Some(target) = target else {
            return Ok(None);
        };

        let mut sets = Vec::new();
        for child in sources.iter_mut() {
            if child.has_next()? && child.peek()?.0 == target {
                sets.push(child.next()?.1);
            }
        }
        let merged = union_sets(&target, node, &sets);
        if merged.matches_nothing() {
            trace!(shard = %target, "union empty; skipping shard");
            continue;
        }
        return Ok(Some((target, merged)));
    }
}

/// Unions match sets of one shard; `sets` is in child order.
fn union_sets(shard: &str, node: Option<NodeId>, sets: &[ShardMatchSet]) -> ShardMatchSet {
    let owner = node.or_else(|| sets.first().and_then(ShardMatchSet::node));
    let mut merged = ShardMatchSet::new(shard, owner);
    for set in sets {
        if set.is_infinite() {
            merged.mark_infinite();
        }
        for record in set.matches() {
            merged.insert(record.clone());
        }
    }
    merged
}

impl IndexStream for Union<'_> {
    fn context(&self) -> EvaluationContext {
        self.context
    }

    fn current_node(&self) -> Option<NodeId> {
        self.node
    }

    fn can_prune(&self) -> bool {
        self.prunes
    }

    fn deferred_nodes(&self) -> Vec<NodeId> {
        self.sources.iter().flat_map(|c| c.deferred_nodes()).collect()
    }

    fn has_next(&mut self) -> Result<bool> {
        let sources = &mut self.sources;
        let node = self.node;
        self.lookahead.fill(|| advance(sources, node))
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        if !self.has_next()? {
            return Err(exhausted(KIND));
        }
        self.lookahead.peek(KIND)
    }

    fn next(&mut self) -> Result<ShardEntry> {
        if !self.has_next()? {
            return Err(exhausted(KIND));
        }
        self.lookahead.take(KIND)
    }

    fn debug_trace(&self) -> String {
        let children: Vec<_> = self.sources.iter().map(|c| c.debug_trace()).collect();
        format!("Union[{}]({})", self.context, children.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{drain, Intersection, LeafStream};

    fn leaf(node: u32, shards: &[(&str, &[&str])]) -> BoxedStream<'static> {
        let node = Some(NodeId::new(node));
        let sets = shards
            .iter()
            .map(|(shard, uids)| ShardMatchSet::from_uids(*shard, node, uids.iter().copied()))
            .collect();
        Box::new(LeafStream::new(node, sets).unwrap())
    }

    #[test]
    fn test_requires_two_children() {
        let err = Union::new(None, vec![leaf(0, &[("S1", &["x"])])]).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_merges_shards_in_order() {
        let mut or = Union::new(
            None,
            vec![
                leaf(0, &[("S1", &["a"]), ("S3", &["c"])]),
                leaf(1, &[("S2", &["b"])]),
            ],
        )
        .unwrap();

        assert_eq!(or.context(), EvaluationContext::Present);
        let entries = drain(&mut or).unwrap();
        let shards: Vec<_> = entries.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(shards, vec!["S1", "S2", "S3"]);
        assert_eq!(entries[1].1.node(), Some(NodeId::new(1)));
    }

    #[test]
    fn test_duplicate_uid_collapses_to_leftmost() {
        let mut or = Union::new(
            Some(NodeId::new(7)),
            vec![leaf(0, &[("S1", &["a", "b"])]), leaf(1, &[("S1", &["b", "c"])])],
        )
        .unwrap();

        let entries = drain(&mut or).unwrap();
        assert_eq!(entries.len(), 1);
        let set = &entries[0].1;
        assert_eq!(set.uids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(set.get("b").unwrap().node(), Some(NodeId::new(0)));
        assert_eq!(set.get("c").unwrap().node(), Some(NodeId::new(1)));
        assert_eq!(set.node(), Some(NodeId::new(7)));
    }

    #[test]
    fn test_absent_children_dropped() {
        let mut or = Union::new(
            None,
            vec![
                Box::new(LeafStream::absent(Some(NodeId::new(0)))),
                leaf(1, &[("S4", &["x"])]),
            ],
        )
        .unwrap();

        assert_eq!(or.context(), EvaluationContext::Present);
        assert_eq!(drain(&mut or).unwrap().len(), 1);
    }

    #[test]
    fn test_all_absent() {
        let mut or = Union::new(
            None,
            vec![Box::new(LeafStream::absent(None)), Box::new(LeafStream::absent(None))],
        )
        .unwrap();

        assert_eq!(or.context(), EvaluationContext::Absent);
        assert!(!or.has_next().unwrap());
        assert!(matches!(or.next(), Err(Error::IllegalState { .. })));
    }

    #[test]
    fn test_deferred_child_weakens_context() {
        let mut or = Union::new(
            None,
            vec![leaf(0, &[("S1", &["x"])]), Box::new(LeafStream::unindexed(None))],
        )
        .unwrap();

        assert_eq!(or.context(), EvaluationContext::Unindexed);
        assert!(!or.can_prune());
        assert_eq!(drain(&mut or).unwrap().len(), 1);
        assert!(or.debug_trace().contains("Leaf[UNINDEXED]"));
    }

    #[test]
    fn test_variable_child_contributes_data() {
        let node = Some(NodeId::new(3));
        let variable =
            LeafStream::variable(node, vec![ShardMatchSet::from_uids("S2", node, ["v"])]).unwrap();
        let mut or =
            Union::new(None, vec![leaf(0, &[("S1", &["x"])]), Box::new(variable)]).unwrap();

        assert_eq!(or.context(), EvaluationContext::Variable);
        let shards: Vec<_> = drain(&mut or).unwrap().into_iter().map(|(s, _)| s).collect();
        assert_eq!(shards, vec!["S1", "S2"]);
    }

    #[test]
    fn test_infinite_contribution_marks_result() {
        let infinite = LeafStream::new(None, vec![ShardMatchSet::infinite("S1", None)]).unwrap();
        let mut or =
            Union::new(None, vec![leaf(0, &[("S1", &["a"])]), Box::new(infinite)]).unwrap();

        let entries = drain(&mut or).unwrap();
        assert!(entries[0].1.is_infinite());
        assert!(entries[0].1.contains_uid("a"));
    }

    #[test]
    fn test_deferred_intersection_child_keeps_its_shards() {
        let and = Intersection::new(
            Some(NodeId::new(5)),
            vec![
                leaf(1, &[("S2", &["b"])]),
                Box::new(LeafStream::delayed(Some(NodeId::new(2)))),
            ],
        )
        .unwrap();
        let mut or = Union::new(
            Some(NodeId::new(6)),
            vec![leaf(0, &[("S1", &["a"])]), Box::new(and)],
        )
        .unwrap();

        assert_eq!(or.context(), EvaluationContext::Delayed);
        assert!(or.can_prune());
        assert_eq!(or.deferred_nodes(), vec![NodeId::new(2)]);
        let entries = drain(&mut or).unwrap();
        let shards: Vec<_> = entries.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(shards, vec!["S1", "S2"]);
        assert_eq!(entries[1].1.uids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_nested_under_intersection() {
        let or = Union::new(
            None,
            vec![leaf(1, &[("S1", &["q"]), ("S2", &["a"])]), leaf(2, &[("S2", &["b"])])],
        )
        .unwrap();
        let mut and = Intersection::new(
            None,
            vec![leaf(0, &[("S2", &["a", "b", "c"])]), Box::new(or)],
        )
        .unwrap();

        let entries = drain(&mut and).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.uids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
