//! AST module for index-lookup predicates.

mod predicate;

pub use predicate::{NodeKind, PredicateNode, PredicateTree};
