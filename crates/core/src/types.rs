//! Identifier types shared across the engine.
//!
//! Shards are named `yyyyMMdd_N` (one day, partition `N`); a bare `yyyyMMdd`
//! names the whole day. The engine orders shards by their textual form only.

use core::fmt;

/// Identifier of a shard, e.g. `"20150101_0"`.
pub type ShardId = String;

/// Handle to a node of the externally-owned predicate tree.
///
/// The engine never dereferences the tree through this handle; it only uses
/// node identity for grouping and book-keeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node id from its arena index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index of this node.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Returns the `yyyyMMdd` day prefix of a shard id, if it has one.
pub fn shard_date(shard: &str) -> Option<&str> {
    let day = shard.get(..8)?;
    if !day.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match shard.as_bytes().get(8) {
        None | Some(b'_') => Some(day),
        Some(_) => None,
    }
}

/// Returns true if the shard id names a whole day rather than one partition.
pub fn is_day_shard(shard: &str) -> bool {
    shard.len() == 8 && shard_date(shard).is_some()
}
