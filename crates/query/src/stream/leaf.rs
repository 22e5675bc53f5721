//! Leaf index streams.
//!
//! Leaves are where shard data enters the engine. `LeafStream` serves a
//! materialized list of shards; `ScanStream` adapts a lazy scanner and checks
//! the ordering contract as it pulls.

use super::{exhausted, IndexStream, Lookahead, ShardEntry};
use quarry_core::{Error, EvaluationContext, NodeId, Result, ShardId, ShardMatchSet};
use std::iter::Peekable;
use std::vec;

const LEAF: &str = "leaf";
const SCAN: &str = "scan";

/// A leaf stream over shard data that is already in memory.
#[derive(Debug)]
pub struct LeafStream {
    node: Option<NodeId>,
    context: EvaluationContext,
    label: String,
    entries: Peekable<vec::IntoIter<ShardEntry>>,
}

impl LeafStream {
    /// Creates a leaf over shard data.
    ///
    /// The context is `Present`, or `Absent` when `sets` is empty. Shard ids
    /// must ascend strictly.
    pub fn new(node: Option<NodeId>, sets: Vec<ShardMatchSet>) -> Result<Self> {
        let context = if sets.is_empty() {
            EvaluationContext::Absent
        } else {
            EvaluationContext::Present
        };
        Self::with_data(node, context, sets)
    }

    /// Creates a leaf whose shard data does not cover every possible match.
    pub fn variable(node: Option<NodeId>, sets: Vec<ShardMatchSet>) -> Result<Self> {
        Self::with_data(node, EvaluationContext::Variable, sets)
    }

    /// Creates a leaf for a term that provably matches nothing.
    pub fn absent(node: Option<NodeId>) -> Self {
        Self::without_data(node, EvaluationContext::Absent)
    }

    /// Creates a leaf for a predicate deferred to document evaluation.
    pub fn delayed(node: Option<NodeId>) -> Self {
        Self::without_data(node, EvaluationContext::Delayed)
    }

    /// Creates a leaf for a predicate over an unindexed field.
    pub fn unindexed(node: Option<NodeId>) -> Self {
        Self::without_data(node, EvaluationContext::Unindexed)
    }

    /// Attaches a human-readable label used in debug traces.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn with_data(
        node: Option<NodeId>,
        context: EvaluationContext,
        sets: Vec<ShardMatchSet>,
    ) -> Result<Self> {
        let mut last: Option<&str> = None;
        for set in &sets {
            if last.is_some_and(|prev| prev >= set.shard_id()) {
                return Err(Error::invalid_argument(format!(
                    "leaf shards must ascend strictly: '{}' follows '{}'",
                    set.shard_id(),
                    last.unwrap_or_default()
                )));
            }
            last = Some(set.shard_id());
        }

        let entries: Vec<ShardEntry> = sets
            .into_iter()
            .map(|set| (set.shard_id().to_string(), set))
            .collect();
        Ok(Self {
            node,
            context,
            label: default_label(node),
            entries: entries.into_iter().peekable(),
        })
    }

    fn without_data(node: Option<NodeId>, context: EvaluationContext) -> Self {
        Self {
            node,
            context,
            label: default_label(node),
            entries: Vec::new().into_iter().peekable(),
        }
    }
}

impl IndexStream for LeafStream {
    fn context(&self) -> EvaluationContext {
        self.context
    }

    fn current_node(&self) -> Option<NodeId> {
        self.node
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(self.entries.peek().is_some())
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        self.entries.peek().ok_or_else(|| exhausted(LEAF))
    }

    fn next(&mut self) -> Result<ShardEntry> {
        self.entries.next().ok_or_else(|| exhausted(LEAF))
    }

    fn debug_trace(&self) -> String {
        format!("Leaf[{}]({})", self.context, self.label)
    }
}

/// A leaf stream pulling lazily from a scanner.
///
/// The context is `Initialized`: the scan is index-backed but whether it
/// holds anything is only known once pulled. A scanner error, or a shard
/// that does not ascend, ends the stream with that error.
pub struct ScanStream<I> {
    node: Option<NodeId>,
    label: String,
    scanner: I,
    last_shard: Option<ShardId>,
    lookahead: Lookahead,
}

impl<I> ScanStream<I>
where
    I: Iterator<Item = Result<ShardMatchSet>>,
{
    /// Creates a stream over `scanner`.
    pub fn new(node: Option<NodeId>, scanner: I) -> Self {
        Self {
            node,
            label: default_label(node),
            scanner,
            last_shard: None,
            lookahead: Lookahead::default(),
        }
    }

    /// Attaches a human-readable label used in debug traces.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

fn pull<I>(scanner: &mut I, last_shard: &mut Option<ShardId>) -> Result<Option<ShardEntry>>
where
    I: Iterator<Item = Result<ShardMatchSet>>,
{
    let Some(set) = scanner.next().transpose()? else {
        return Ok(None);
    };
    if let Some(prev) = last_shard.as_deref() {
        if prev >= set.shard_id() {
            return Err(Error::illegal_state(format!(
                "scanner emitted shard '{}' after '{prev}'",
                set.shard_id()
            )));
        }
    }
    *last_shard = Some(set.shard_id().to_string());
    Ok(Some((set.shard_id().to_string(), set)))
}

impl<I> IndexStream for ScanStream<I>
where
    I: Iterator<Item = Result<ShardMatchSet>>,
{
    fn context(&self) -> EvaluationContext {
        EvaluationContext::Initialized
    }

    fn current_node(&self) -> Option<NodeId> {
        self.node
    }

    fn has_next(&mut self) -> Result<bool> {
        let scanner = &mut self.scanner;
        let last_shard = &mut self.last_shard;
        self.lookahead.fill(|| pull(scanner, last_shard))
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        if !self.has_next()? {
            return Err(exhausted(SCAN));
        }
        self.lookahead.peek(SCAN)
    }

    fn next(&mut self) -> Result<ShardEntry> {
        if !self.has_next()? {
            return Err(exhausted(SCAN));
        }
        self.lookahead.take(SCAN)
    }

    fn debug_trace(&self) -> String {
        format!(
            "Scan[{}]({}, last={})",
            EvaluationContext::Initialized,
            self.label,
            self.last_shard.as_deref().unwrap_or("-")
        )
    }
}

fn default_label(node: Option<NodeId>) -> String {
    node.map_or_else(|| "<no node>".to_string(), |n| n.to_string())
}
