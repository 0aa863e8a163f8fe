//! Core data structures for Tetralog.
//!
//! Three layers:
//! - **Terms**: canonical tagged values (`Term`) with a stable textual
//!   encoding, deduplicated into cheap `TermId` handles by `TermInterner`
//! - **Trie indexes**: nested-map tuple storage (`TrieIndex`) with a
//!   configurable term order, pruning deletes, and lazy pattern scans
//! - **Store**: `QuadStore` maintaining one trie per materialized term
//!   order, plus the order-selection policy for compiled patterns

pub mod interner;
pub mod store;
pub mod term;
pub mod trie;

#[cfg(test)]
mod interner_tests;
#[cfg(test)]
mod store_tests;

pub use interner::{TermId, TermInterner};
pub use store::{GRAPH, OBJECT, PREDICATE, QuadStore, SPOG, SUBJECT, TermOrder};
pub use term::Term;
pub use trie::{Scan, TrieIndex, TrieNode};
