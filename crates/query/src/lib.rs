//! Quarry Query - Index-stream evaluation for Quarry predicate trees.
//!
//! This crate turns a predicate tree into a tree of index streams:
//!
//! - `ast`: Predicate tree definitions
//! - `stream`: The `IndexStream` contract, leaves, Intersection, Union and
//!   the ancestor-dedup decorator
//! - `builder`: Stream tree construction from a predicate tree
//! - `source`: Leaf streams backed by a `quarry_index::ShardIndex`
//!
//! # Example
//!
//! ```rust
//! use quarry_core::EngineConfig;
//! use quarry_index::ShardIndex;
//! use quarry_query::ast::PredicateTree;
//! use quarry_query::builder::StreamBuilder;
//! use quarry_query::source::IndexLeafSource;
//! use quarry_query::stream::drain;
//!
//! let mut index = ShardIndex::new();
//! index.add("NAME", "meadow", "20150101_0", "a.1");
//! index.add("GENDER", "female", "20150101_0", "a.1");
//! index.add("GENDER", "female", "20150101_0", "c.3");
//!
//! let mut tree = PredicateTree::new();
//! let name = tree.term("NAME", "meadow").unwrap();
//! let gender = tree.term("GENDER", "female").unwrap();
//! let and = tree.and([name, gender]).unwrap();
//! tree.set_root(and).unwrap();
//!
//! let config = EngineConfig::default();
//! let mut source = IndexLeafSource::new(&index, &config);
//! let mut stream = StreamBuilder::new(&tree, config.clone()).build(&mut source).unwrap();
//!
//! let entries = drain(&mut stream).unwrap();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].1.uids().collect::<Vec<_>>(), vec!["a.1"]);
//! ```

pub mod ast;
pub mod builder;
pub mod source;
pub mod stream;

pub use builder::{LeafSource, StreamBuilder};
pub use source::IndexLeafSource;
pub use stream::{
    drain, AncestorIndexStream, BoxedStream, IndexStream, Intersection, LeafStream, ScanStream,
    ShardEntry, Union,
};
