//! Quarry Index - In-memory sharded field index.
//!
//! This crate provides the storage-side collaborator of the engine:
//!
//! - `ShardIndex`: `(field, value)` → shard → posting list of uids
//! - `PostingList`: sorted uids within one shard
//! - `ShardRange`: inclusive day bounds over `yyyyMMdd_N` shard ids
//! - `TermStats`: scan counters, including shards marked infinite
//!
//! # Example
//!
//! ```rust
//! use quarry_index::{ScanOptions, ShardIndex};
//!
//! let mut index = ShardIndex::new();
//! index.add("NAME", "meadow", "20150101_0", "a.1");
//! index.add("NAME", "meadow", "20150102_0", "b.2");
//!
//! let shards: Vec<_> = index
//!     .scan("NAME", "meadow", None, &ScanOptions::new())
//!     .map(|set| set.shard_id().to_string())
//!     .collect();
//! assert_eq!(shards, vec!["20150101_0", "20150102_0"]);
//! ```

pub mod shard;
pub mod stats;

pub use shard::{PostingList, ScanOptions, ShardIndex, ShardRange, TermScan, TermStatus};
pub use stats::TermStats;
