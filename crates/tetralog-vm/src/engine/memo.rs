//! Clause memoization and evaluation statistics.

use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use tetralog_bytecode::ClauseId;
use tetralog_core::TermId;

/// One answer of a clause call: a term per parameter, `None` where the
/// derivation left the parameter unbound.
pub type Row = Box<[Option<TermId>]>;

/// One argument of a call key. Bound arguments carry their value; unbound
/// arguments carry the first parameter position aliased to the same heap
/// cell. Two calls share a key exactly when they agree on bound values and
/// on which unbound parameters are aliased to each other, regardless of
/// which caller variables they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum KeyArg {
    In(TermId),
    Out(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MemoKey {
    pub clause: ClauseId,
    pub args: Box<[KeyArg]>,
}

#[derive(Debug)]
pub(crate) enum MemoEntry {
    /// The key's derivation run is currently on the stack. A re-entrant
    /// call under the same key yields no answers instead of diverging.
    InProgress,
    Complete(Rc<Vec<Row>>),
}

#[derive(Debug, Default)]
pub(crate) struct MemoTable {
    entries: HashMap<MemoKey, MemoEntry>,
}

impl MemoTable {
    pub fn get(&self, key: &MemoKey) -> Option<&MemoEntry> {
        self.entries.get(key)
    }

    pub fn begin(&mut self, key: MemoKey) {
        self.entries.insert(key, MemoEntry::InProgress);
    }

    pub fn complete(&mut self, key: &MemoKey, rows: Rc<Vec<Row>>) {
        self.entries.insert(key.clone(), MemoEntry::Complete(rows));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Counters accumulated across a processor's lifetime.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EvalStats {
    /// Instructions dispatched.
    pub steps: u64,
    /// Backtrack events.
    pub backtracks: u64,
    /// Solutions emitted by top-level programs.
    pub solutions: u64,
    /// Clause calls answered from the memo table.
    pub memo_hits: u64,
    body_runs: Vec<u64>,
}

impl EvalStats {
    pub(crate) fn note_body_run(&mut self, clause: ClauseId) {
        let idx = clause.0 as usize;
        if self.body_runs.len() <= idx {
            self.body_runs.resize(idx + 1, 0);
        }
        self.body_runs[idx] += 1;
    }

    /// How many times the clause's body was actually derived (memo misses).
    pub fn body_runs(&self, clause: ClauseId) -> u64 {
        self.body_runs
            .get(clause.0 as usize)
            .copied()
            .unwrap_or(0)
    }
}
