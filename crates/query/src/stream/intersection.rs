//! Intersection of index streams (AND).
//!
//! Children whose shards bound their matches (see
//! [`IndexStream::can_prune`]) are merge-joined on shard id. Children that
//! cannot prune (`Variable`, `Delayed` or `Unindexed` leaves, and composites
//! without a pruning child) are set aside as deferred nodes for the document
//! evaluator. Every non-absent child weakens the composite's context. One
//! `Absent` child empties the whole conjunction.

use super::{exhausted, BoxedStream, IndexStream, Lookahead, ShardEntry};
use quarry_core::{Error, EvaluationContext, NodeId, Result, ShardMatchSet};
use tracing::{debug, trace};

const KIND: &str = "intersection";

/// Merge-join of two or more streams under AND semantics.
pub struct Intersection<'a> {
    node: Option<NodeId>,
    context: EvaluationContext,
    filters: Vec<BoxedStream<'a>>,
    deferred: Vec<BoxedStream<'a>>,
    lookahead: Lookahead,
}

impl<'a> Intersection<'a> {
    /// Builds the intersection of `children` for the AND node `node`.
    ///
    /// Fails with `InvalidArgument` for fewer than two children.
    pub fn new(node: Option<NodeId>, children: Vec<BoxedStream<'a>>) -> Result<Self> {
        if children.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "intersection requires at least two children, got {}",
                children.len()
            )));
        }

        let mut lookahead = Lookahead::default();
        let absent = children
            .iter()
            .find(|c| c.context() == EvaluationContext::Absent)
            .map(|c| c.current_node());
        if let Some(absent) = absent {
            debug!(node = ?node, absent = ?absent, "absent term empties intersection");
            lookahead.finish();
            return Ok(Self {
                node,
                context: EvaluationContext::Absent,
                filters: Vec::new(),
                deferred: children,
                lookahead,
            });
        }

        let (filters, deferred): (Vec<_>, Vec<_>) =
            children.into_iter().partition(|c| c.can_prune());

        if filters.is_empty() {
            lookahead.finish();
        }
        let context = EvaluationContext::weakest(
            filters.iter().chain(deferred.iter()).map(|c| c.context()),
        )
        .unwrap_or(EvaluationContext::Absent);

        debug!(
            node = ?node,
            context = %context,
            filtering = filters.len(),
            deferred = deferred.len(),
            "built intersection"
        );
        Ok(Self {
            node,
            context,
            filters,
            deferred,
            lookahead,
        })
    }

}

/// Advances the filtering children to the next shard they all hold with a
/// non-empty intersection.
fn advance(filters: &mut [BoxedStream<'_>], node: Option<NodeId>) -> Result<Option<ShardEntry>> {
    loop {
        let mut target: Option<String> = None;
        for child in filters.iter_mut() {
            if !child.has_next()? {
                return Ok(None);
            }
            let shard = &child.peek()?.0;
            if target.as_deref().map_or(true, |t| shard.as_str() > t) {
                target = Some(shard.clone());
            }
        }
        let Some(target) = target else {
            return Ok(None);
        };

        let mut aligned = true;
        for child in filters.iter_mut() {
            while child.has_next()? && child.peek()?.0 < target {
                child.next()?;
            }
            if !child.has_next()? {
                return Ok(None);
            }
            if child.peek()?.0 != target {
                aligned = false;
            }
        }
        if !aligned {
            continue;
        }

        let sets = filters
            .iter_mut()
            .map(|child| child.next().map(|(_, set)| set))
            .collect::<Result<Vec<_>>>()?;
        let merged = intersect_sets(&target, node, &sets);
        if merged.matches_nothing() {
            trace!(shard = %target, "intersection empty; skipping shard");
            continue;
        }
        return Ok(Some((target, merged)));
    }
}

/// Intersects the match sets of one shard by uid.
///
/// Infinite sets do not filter. If every set is infinite the result is too.
fn intersect_sets(shard: &str, node: Option<NodeId>, sets: &[ShardMatchSet]) -> ShardMatchSet {
    let finite: Vec<&ShardMatchSet> = sets.iter().filter(|s| !s.is_infinite()).collect();
    let Some((first, rest)) = finite.split_first() else {
        let owner = node.or_else(|| sets.first().and_then(ShardMatchSet::node));
        return ShardMatchSet::infinite(shard, owner);
    };

    let owner = node.or_else(|| first.node());
    let mut merged = ShardMatchSet::new(shard, owner);
    for record in first.matches() {
        if rest.iter().all(|other| other.contains_uid(record.uid())) {
            merged.insert(record.with_node(node.or(record.node())));
        }
    }
    merged
}

impl IndexStream for Intersection<'_> {
    fn context(&self) -> EvaluationContext {
        self.context
    }

    fn current_node(&self) -> Option<NodeId> {
        self.node
    }

    fn can_prune(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Nodes of the children set aside, followed by whatever the pruning
    /// children still defer.
    fn deferred_nodes(&self) -> Vec<NodeId> {
        if self.context == EvaluationContext::Absent {
            return Vec::new();
        }
        let mut nodes: Vec<NodeId> = self
            .deferred
            .iter()
            .filter_map(|c| c.current_node())
            .collect();
        for child in &self.filters {
            nodes.extend(child.deferred_nodes());
        }
        nodes
    }

    fn has_next(&mut self) -> Result<bool> {
        let filters = &mut self.filters;
        let node = self.node;
        self.lookahead.fill(|| advance(filters, node))
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
        let filters: Vec<_> = self.filters.iter().map(|c| c.debug_trace()).collect();
        let deferred: Vec<_> = self.deferred.iter().map(|c| c.debug_trace()).collect();
        format!(
            "Intersection[{}]({}; deferred: {})",
            self.context,
            filters.join(", "),
            deferred.join(", ")
        )
    }
}
