//! Match records and per-shard match sets.

use crate::types::{NodeId, ShardId};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeSet;

/// One identifier that matched one predicate in one shard.
///
/// Ordering and equality look at the uid only; the node travels along so
/// the document evaluator knows which predicate produced the hit.
#[derive(Clone, Debug)]
pub struct MatchRecord {
    uid: String,
    node: Option<NodeId>,
}

impl MatchRecord {
    /// Creates a new match record.
    pub fn new(uid: impl Into<String>, node: Option<NodeId>) -> Self {
        Self {
            uid: uid.into(),
            node,
        }
    }

    /// Returns the matched identifier.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the predicate node that produced this match.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Returns a copy of this record attributed to another node.
    pub fn with_node(&self, node: Option<NodeId>) -> Self {
        Self {
            uid: self.uid.clone(),
            node,
        }
    }
}

impl PartialEq for MatchRecord {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for MatchRecord {}

impl PartialOrd for MatchRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uid.cmp(&other.uid)
    }
}

impl Borrow<str> for MatchRecord {
    fn borrow(&self) -> &str {
        &self.uid
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{}@{}", self.uid, node),
            None => f.write_str(&self.uid),
        }
    }
}

/// All matches of one predicate within one shard.
///
/// An infinite set stands for "every document in this shard": the scanner
/// stopped enumerating because the term exceeded its threshold. Whatever
/// records it still carries are a sample, not a bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardMatchSet {
    shard_id: ShardId,
    matches: BTreeSet<MatchRecord>,
    node: Option<NodeId>,
    infinite: bool,
}

impl ShardMatchSet {
    /// Creates an empty, finite match set.
    pub fn new(shard_id: impl Into<ShardId>, node: Option<NodeId>) -> Self {
        Self {
            shard_id: shard_id.into(),
            matches: BTreeSet::new(),
            node,
            infinite: false,
        }
    }

    /// Creates a match set from uids, each attributed to `node`.
    pub fn from_uids<I, S>(shard_id: impl Into<ShardId>, node: Option<NodeId>, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(shard_id, node);
        for uid in uids {
            set.insert(MatchRecord::new(uid, node));
        }
        set
    }

    /// Creates a match set from existing records.
    pub fn from_records<I>(shard_id: impl Into<ShardId>, node: Option<NodeId>, records: I) -> Self
    where
        I: IntoIterator<Item = MatchRecord>,
    {
        let mut set = Self::new(shard_id, node);
        for record in records {
            set.insert(record);
        }
        set
    }

    /// Creates an infinite match set with no enumerated records.
    pub fn infinite(shard_id: impl Into<ShardId>, node: Option<NodeId>) -> Self {
        let mut set = Self::new(shard_id, node);
        set.infinite = true;
        set
    }

    /// Inserts a record. The first record for a uid wins.
    /// Returns true if the record was added.
    pub fn insert(&mut self, record: MatchRecord) -> bool {
        if self.matches.contains(record.uid()) {
            return false;
        }
        self.matches.insert(record)
    }

    /// Marks this set as infinite.
    pub fn mark_infinite(&mut self) {
        self.infinite = true;
    }

    /// Sets the node this set is attributed to.
    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// Returns the shard this set belongs to.
    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    /// Returns the records in uid order.
    pub fn matches(&self) -> &BTreeSet<MatchRecord> {
        &self.matches
    }

    /// Consumes the set and returns its records.
    pub fn into_matches(self) -> BTreeSet<MatchRecord> {
        self.matches
    }

    /// Returns the node that produced this set.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Returns true if this shard matches everything.
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// Returns the record for `uid`, if present.
    pub fn get(&self, uid: &str) -> Option<&MatchRecord> {
        self.matches.get(uid)
    }

    /// Returns true if the set holds a record for `uid`.
    pub fn contains_uid(&self, uid: &str) -> bool {
        self.matches.contains(uid)
    }

    /// Returns the uids in order.
    pub fn uids(&self) -> impl Iterator<Item = &str> + '_ {
        self.matches.iter().map(MatchRecord::uid)
    }

    /// Returns the number of enumerated records.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if no records are enumerated.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns true if this set can match no document at all.
    pub fn matches_nothing(&self) -> bool {
        !self.infinite && self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_order_ignores_node() {
        let a = MatchRecord::new("a.1", Some(NodeId::new(1)));
        let b = MatchRecord::new("a.1", Some(NodeId::new(2)));
        let c = MatchRecord::new("b", None);

        assert_eq!(a, b);
        assert!(a < c);
        assert_eq!(a.to_string(), "a.1@#1");
        assert_eq!(c.to_string(), "b");
    }

    #[test]
    fn test_insert_keeps_first_record() {
        let mut set = ShardMatchSet::new("20150101_0", None);
        assert!(set.insert(MatchRecord::new("x", Some(NodeId::new(1)))));
        assert!(!set.insert(MatchRecord::new("x", Some(NodeId::new(2)))));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("x").and_then(MatchRecord::node), Some(NodeId::new(1)));
    }

    #[test]
    fn test_from_uids_sorted_and_unique() {
        let set = ShardMatchSet::from_uids("S1", Some(NodeId::new(3)), ["z", "x", "y", "x"]);
        let uids: Vec<_> = set.uids().collect();

        assert_eq!(uids, vec!["x", "y", "z"]);
        assert!(set.matches().iter().all(|m| m.node() == Some(NodeId::new(3))));
        assert_eq!(set.shard_id(), "S1");
    }

    #[test]
    fn test_infinite_set() {
        let set = ShardMatchSet::infinite("S2", None);
        assert!(set.is_infinite());
        assert!(set.is_empty());
        assert!(!set.matches_nothing());

        let empty = ShardMatchSet::new("S2", None);
        assert!(empty.matches_nothing());
    }
}
