//! Index streams.
//!
//! An index stream is a lazily pulled, shard-ordered sequence of
//! `(shard id, ShardMatchSet)` pairs for one predicate node. Leaf streams come
//! straight from index scans; composites merge-join other streams, so any
//! stream can be nested inside any composite.
//!
//! Every stream upholds the same contract:
//!
//! - shard ids ascend strictly over the life of the stream
//! - `peek` never advances, `next` advances exactly once and returns what
//!   `peek` would have returned
//! - `peek`/`next` on an exhausted stream fail with `IllegalState`
//! - `remove` always fails with `UnsupportedOperation`
//! - the context is fixed at construction
//!
//! The context says what a stream knows about its own predicate.
//! `can_prune` says whether its shards bound the candidate set, which a
//! deferred composite can still do.

mod ancestor;
mod intersection;
mod leaf;
mod union;

pub use ancestor::{remove_overlapping, AncestorIndexStream};
pub use intersection::Intersection;
pub use leaf::{LeafStream, ScanStream};
pub use union::Union;

use quarry_core::{Error, EvaluationContext, NodeId, Result, ShardId, ShardMatchSet};

/// One item of an index stream.
pub type ShardEntry = (ShardId, ShardMatchSet);

/// A boxed, type-erased index stream.
pub type BoxedStream<'a> = Box<dyn IndexStream + 'a>;

/// Pull-based stream contract shared by leaf and composite streams.
pub trait IndexStream {
    /// Returns the fixed evaluation context of this stream.
    fn context(&self) -> EvaluationContext;

    /// Returns the predicate node this stream evaluates.
    fn current_node(&self) -> Option<NodeId>;

    /// Returns true if another pair remains. May pull from children.
    fn has_next(&mut self) -> Result<bool>;

    /// Returns the next pair without advancing.
    fn peek(&mut self) -> Result<&ShardEntry>;

    /// Returns the next pair and advances past it.
    fn next(&mut self) -> Result<ShardEntry>;

    /// Returns true if every match of this stream's predicate lies in a
    /// shard the stream emits, so a parent intersection may prune on it.
    ///
    /// This can hold for a composite whose context is deferred: an
    /// intersection with at least one filtering child still bounds its
    /// candidate shards.
    fn can_prune(&self) -> bool {
        self.context().can_filter()
    }

    /// Returns the predicate nodes that must still be checked against each
    /// document this stream yields.
    fn deferred_nodes(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// Index streams are read-only.
    fn remove(&mut self) -> Result<()> {
        Err(Error::unsupported("remove"))
    }

    /// Describes this stream for diagnostics.
    fn debug_trace(&self) -> String;
}

impl<T> IndexStream for Box<T>
where
    T: IndexStream + ?Sized,
{
    fn context(&self) -> EvaluationContext {
        self.as_ref().context()
    }

    fn current_node(&self) -> Option<NodeId> {
        self.as_ref().current_node()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.as_mut().has_next()
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        self.as_mut().peek()
    }

    fn next(&mut self) -> Result<ShardEntry> {
        self.as_mut().next()
    }

    fn can_prune(&self) -> bool {
        self.as_ref().can_prune()
    }

    fn deferred_nodes(&self) -> Vec<NodeId> {
        self.as_ref().deferred_nodes()
    }

    fn remove(&mut self) -> Result<()> {
        self.as_mut().remove()
    }

    fn debug_trace(&self) -> String {
        self.as_ref().debug_trace()
    }
}

impl<T> IndexStream for &mut T
where
    T: IndexStream + ?Sized,
{
    fn context(&self) -> EvaluationContext {
        (**self).context()
    }

    fn current_node(&self) -> Option<NodeId> {
        (**self).current_node()
    }

    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn peek(&mut self) -> Result<&ShardEntry> {
        (**self).peek()
    }

    fn next(&mut self) -> Result<ShardEntry> {
        (**self).next()
    }

    fn can_prune(&self) -> bool {
        (**self).can_prune()
    }

    fn deferred_nodes(&self) -> Vec<NodeId> {
        (**self).deferred_nodes()
    }

    fn remove(&mut self) -> Result<()> {
        (**self).remove()
    }

    fn debug_trace(&self) -> String {
        (**self).debug_trace()
    }
}

/// Pulls every remaining pair out of a stream.
pub fn drain<S>(stream: &mut S) -> Result<Vec<ShardEntry>>
where
    S: IndexStream + ?Sized,
{
    let mut entries = Vec::new();
    while stream.has_next()? {
        entries.push(stream.next()?);
    }
    Ok(entries)
}

/// Error for `peek`/`next` on an exhausted stream.
fn exhausted(kind: &str) -> Error {
    Error::illegal_state(format!("{kind} stream is exhausted"))
}

/// Lookahead slot shared by the composite streams.
///
/// A composite computes at most one pending pair ahead and caches it, so
/// `has_next` and `peek` are repeatable and `next` hands out exactly what
/// was peeked. A child failure poisons the slot: the same error is returned
/// on every later call.
#[derive(Debug, Default)]
struct Lookahead {
    pending: Option<ShardEntry>,
    done: bool,
    failure: Option<Error>,
}

impl Lookahead {
    /// Fills the slot with `advance` unless it already holds a pair or the
    /// stream is finished. Returns whether a pair is pending.
    fn fill<F>(&mut self, advance: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Option<ShardEntry>>,
    {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.done {
            return Ok(false);
        }
        match advance() {
            Ok(Some(entry)) => {
                self.pending = Some(entry);
                Ok(true)
            }
            Ok(None) => {
                self.done = true;
                Ok(false)
            }
            Err(err) => {
                tracing::warn!(error = %err, "index stream failed; aborting evaluation");
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn peek(&self, kind: &str) -> Result<&ShardEntry> {
        self.pending.as_ref().ok_or_else(|| exhausted(kind))
    }

    fn take(&mut self, kind: &str) -> Result<ShardEntry> {
        self.pending.take().ok_or_else(|| exhausted(kind))
    }

    fn finish(&mut self) {
        self.done = true;
    }
}
