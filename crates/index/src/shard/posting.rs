//! Posting list implementation for the shard index.
//!
//! A posting list is the sorted set of uids holding a term within one shard.

use std::collections::BTreeSet;

/// A posting list storing uids in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    uids: BTreeSet<String>,
}

impl PostingList {
    /// Creates a new empty posting list.
    pub fn new() -> Self {
        Self {
            uids: BTreeSet::new(),
        }
    }

    /// Adds a uid to the posting list.
    /// Returns true if the uid was not present yet.
    pub fn add(&mut self, uid: impl Into<String>) -> bool {
        self.uids.insert(uid.into())
    }

    /// Removes a uid from the posting list.
    /// Returns true if the uid was present.
    pub fn remove(&mut self, uid: &str) -> bool {
        self.uids.remove(uid)
    }

    /// Checks if the posting list contains a uid.
    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    /// Returns the number of uids in the posting list.
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// Returns true if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Returns an iterator over the uids in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.uids.iter().map(String::as_str)
    }
}
