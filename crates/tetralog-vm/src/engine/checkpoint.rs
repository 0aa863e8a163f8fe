//! Choice points.
//!
//! A checkpoint freezes the processor registers and heap marks at the
//! moment a nondeterministic step had more than one way to proceed.
//! Backtracking restores the frozen state and pulls the next alternative
//! from the checkpoint's [`Resume`]; the checkpoint is popped only once
//! its alternatives are exhausted.

use std::collections::{btree_map, btree_set};
use std::rc::Rc;

use tetralog_core::{TermId, TrieNode};

use super::memo::Row;

#[derive(Debug)]
pub(crate) struct Checkpoint<'a> {
    /// Continuation address: where execution resumes after applying an
    /// alternative.
    pub pc: u16,
    pub env: u32,
    pub callee: u32,
    pub cursor: Option<&'a TrieNode>,
    pub trail_mark: usize,
    pub heap_mark: u32,
    pub resume: Resume<'a>,
}

/// The pending alternatives of a choice point.
#[derive(Debug)]
pub(crate) enum Resume<'a> {
    /// Enumerate the children of a trie branch, binding each key into `slot`.
    Branch {
        iter: btree_map::Iter<'a, TermId, TrieNode>,
        slot: u32,
    },
    /// Enumerate the members of a trie leaf, binding each into `slot`.
    Members {
        iter: btree_set::Iter<'a, TermId>,
        slot: u32,
    },
    /// Replay memoized answer rows into the callee frame at `base`.
    Rows {
        rows: Rc<Vec<Row>>,
        next: usize,
        base: u32,
        arity: u16,
    },
    /// A single alternative branch target. `None` once consumed.
    Alt { addr: Option<u16> },
}
