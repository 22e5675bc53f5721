//! Sharded field index.
//!
//! Maps each `(field, value)` term to the shards holding it, and each shard
//! to the posting list of uids with that term. Scans hand out one
//! `ShardMatchSet` per shard in ascending shard order, which is the shape
//! leaf index streams consume.

mod posting;
mod range;

pub use posting::PostingList;
pub use range::ShardRange;

use crate::stats::TermStats;
use quarry_core::{NodeId, ShardId, ShardMatchSet};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use tracing::trace;

/// Outcome of looking a term up before scanning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermStatus {
    /// The field has no index; the term cannot be scanned.
    Unindexed,
    /// The field is indexed but no shard holds the term.
    Missing,
    /// At least one shard holds the term.
    Found,
}

/// Per-scan settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Restricts the scan to shards within these days.
    pub range: Option<ShardRange>,
    /// Shards holding more uids than this are returned as infinite.
    pub uid_threshold: Option<usize>,
}

impl ScanOptions {
    /// Creates options that scan everything and enumerate every shard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the scan to a day range.
    pub fn with_range(mut self, range: ShardRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Sets the per-shard uid threshold.
    pub fn with_uid_threshold(mut self, threshold: usize) -> Self {
        self.uid_threshold = Some(threshold);
        self
    }
}

/// An in-memory sharded field index.
#[derive(Debug, Clone, Default)]
pub struct ShardIndex {
    /// Fields that carry an index, whether or not any term was added.
    indexed_fields: BTreeSet<String>,
    /// (Field, Value) → Shard → uids
    terms: BTreeMap<(String, String), BTreeMap<ShardId, PostingList>>,
    /// Statistics
    stats: TermStats,
}

impl ShardIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scan statistics for this index.
    pub fn stats(&self) -> &TermStats {
        &self.stats
    }

    /// Declares a field as indexed without adding any term.
    pub fn declare_indexed(&mut self, field: impl Into<String>) {
        self.indexed_fields.insert(field.into());
    }

    /// Returns true if the field carries an index.
    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed_fields.contains(field)
    }

    /// Indexes `uid` under `field == value` in `shard`.
    /// Returns true if the entry was not present yet.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        shard: impl Into<ShardId>,
        uid: impl Into<String>,
    ) -> bool {
        let field = field.into();
        self.indexed_fields.insert(field.clone());
        self.terms
            .entry((field, value.into()))
            .or_default()
            .entry(shard.into())
            .or_default()
            .add(uid)
    }

    /// Removes one entry. Empty posting lists and terms are dropped.
    /// Returns true if the entry was present.
    pub fn remove(&mut self, field: &str, value: &str, shard: &str, uid: &str) -> bool {
        let key = (field.to_string(), value.to_string());
        let Some(shards) = self.terms.get_mut(&key) else {
            return false;
        };
        let Some(posting) = shards.get_mut(shard) else {
            return false;
        };
        let removed = posting.remove(uid);
        if posting.is_empty() {
            shards.remove(shard);
        }
        if shards.is_empty() {
            self.terms.remove(&key);
        }
        removed
    }

    /// Looks a term up without scanning it.
    pub fn term_status(&self, field: &str, value: &str) -> TermStatus {
        if !self.is_indexed(field) {
            return TermStatus::Unindexed;
        }
        if self.shards_for(field, value).is_some() {
            TermStatus::Found
        } else {
            TermStatus::Missing
        }
    }

    /// Returns the number of shards holding the term.
    pub fn shard_count(&self, field: &str, value: &str) -> usize {
        self.shards_for(field, value).map_or(0, BTreeMap::len)
    }

    /// Scans a term, attributing every match to `node`.
    ///
    /// Shards are produced in ascending order. An unknown or unindexed term
    /// produces nothing; use [`ShardIndex::term_status`] to tell them apart.
    pub fn scan<'a>(
        &'a self,
        field: &str,
        value: &str,
        node: Option<NodeId>,
        options: &ScanOptions,
    ) -> TermScan<'a> {
        self.stats.record_scan();
        let lower = match &options.range {
            Some(range) => Bound::Included(range.begin()),
            None => Bound::Unbounded,
        };
        let shards = self
            .shards_for(field, value)
            .map(|shards| shards.range::<str, _>((lower, Bound::Unbounded)));

        TermScan {
            shards,
            node,
            range: options.range.clone(),
            uid_threshold: options.uid_threshold,
            stats: &self.stats,
        }
    }

    fn shards_for(&self, field: &str, value: &str) -> Option<&BTreeMap<ShardId, PostingList>> {
        self.terms.get(&(field.to_string(), value.to_string()))
    }
}

/// Lazy, shard-ordered scan over one term.
pub struct TermScan<'a> {
    shards: Option<btree_map::Range<'a, ShardId, PostingList>>,
    node: Option<NodeId>,
    range: Option<ShardRange>,
    uid_threshold: Option<usize>,
    stats: &'a TermStats,
}

impl Iterator for TermScan<'_> {
    type Item = ShardMatchSet;

    fn next(&mut self) -> Option<ShardMatchSet> {
        let shards = self.shards.as_mut()?;
        loop {
            let (shard, posting) = shards.next()?;
            if let Some(range) = &self.range {
                if range.is_past_end(shard) {
                    self.shards = None;
                    return None;
                }
                if !range.contains(shard) {
                    continue;
                }
            }

            let over = self.uid_threshold.is_some_and(|cap| posting.len() > cap);
            self.stats.record_shard(over);
            if over {
                trace!(shard = %shard, uids = posting.len(), "term exceeds shard threshold");
                return Some(ShardMatchSet::infinite(shard.clone(), self.node));
            }
            return Some(ShardMatchSet::from_uids(
                shard.clone(),
                self.node,
                posting.iter(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ShardIndex {
        let mut index = ShardIndex::new();
        index.add("NAME", "meadow", "20150101_0", "a.1");
        index.add("NAME", "meadow", "20150101_0", "a.1.2");
        index.add("NAME", "meadow", "20150101_1", "c.3");
        index.add("NAME", "meadow", "20150103_0", "d.4");
        index.add("NAME", "tony", "20150101_0", "b.5");
        index.declare_indexed("GENDER");
        index
    }

    #[test]
    fn test_term_status() {
        let index = sample_index();
        assert_eq!(index.term_status("NAME", "meadow"), TermStatus::Found);
        assert_eq!(index.term_status("NAME", "carmela"), TermStatus::Missing);
        assert_eq!(index.term_status("GENDER", "female"), TermStatus::Missing);
        assert_eq!(index.term_status("AGE", "18"), TermStatus::Unindexed);
        assert_eq!(index.shard_count("NAME", "meadow"), 3);
    }

    #[test]
    fn test_scan_shard_order() {
        let index = sample_index();
        let node = Some(NodeId::new(2));
        let sets: Vec<_> = index.scan("NAME", "meadow", node, &ScanOptions::new()).collect();

        let shards: Vec<_> = sets.iter().map(|s| s.shard_id()).collect();
        assert_eq!(shards, vec!["20150101_0", "20150101_1", "20150103_0"]);
        assert_eq!(sets[0].uids().collect::<Vec<_>>(), vec!["a.1", "a.1.2"]);
        assert!(sets.iter().all(|s| s.node() == node));
    }

    #[test]
    fn test_scan_range() {
        let index = sample_index();
        let options = ScanOptions::new().with_range(ShardRange::day("20150101").unwrap());
        let shards: Vec<_> = index
            .scan("NAME", "meadow", None, &options)
            .map(|s| s.shard_id().to_string())
            .collect();

        assert_eq!(shards, vec!["20150101_0", "20150101_1"]);
    }

    #[test]
    fn test_scan_threshold_marks_infinite() {
        let index = sample_index();
        let options = ScanOptions::new().with_uid_threshold(1);
        let sets: Vec<_> = index.scan("NAME", "meadow", None, &options).collect();

        assert!(sets[0].is_infinite());
        assert!(sets[0].is_empty());
        assert!(!sets[1].is_infinite());
        assert_eq!(index.stats().shards_over_threshold(), 1);
        assert_eq!(index.stats().shards_scanned(), 3);
    }

    #[test]
    fn test_scan_missing_term() {
        let index = sample_index();
        assert_eq!(index.scan("NAME", "carmela", None, &ScanOptions::new()).count(), 0);
        assert_eq!(index.stats().scans(), 1);
    }

    #[test]
    fn test_remove_drops_empty_terms() {
        let mut index = sample_index();
        assert!(index.remove("NAME", "tony", "20150101_0", "b.5"));
        assert!(!index.remove("NAME", "tony", "20150101_0", "b.5"));
        assert_eq!(index.term_status("NAME", "tony"), TermStatus::Missing);
        assert!(index.is_indexed("NAME"));
    }
}
