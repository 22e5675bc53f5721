//! Quarry Core - Match data model for the Quarry index-stream engine.
//!
//! This crate provides the types every stream in the engine trades in:
//!
//! - `MatchRecord`: one uid that matched one predicate node
//! - `ShardMatchSet`: the matches of one predicate within one shard
//! - `EvaluationContext`: what a stream can tell about its predicate
//! - `NodeId`: handle to a node of the predicate tree
//! - `EngineConfig`: per-query build settings
//! - `Error`: error types for stream construction and evaluation
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{MatchRecord, NodeId, ShardMatchSet};
//!
//! let node = Some(NodeId::new(0));
//! let mut set = ShardMatchSet::from_uids("20150101_0", node, ["a.1", "b.5"]);
//! set.insert(MatchRecord::new("a.1.2", node));
//!
//! assert_eq!(set.uids().collect::<Vec<_>>(), vec!["a.1", "a.1.2", "b.5"]);
//! ```

mod config;
mod context;
mod error;
mod matches;
mod types;

pub use config::EngineConfig;
pub use context::EvaluationContext;
pub use error::{Error, Result};
pub use matches::{MatchRecord, ShardMatchSet};
pub use types::{is_day_shard, shard_date, NodeId, ShardId};
