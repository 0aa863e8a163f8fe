//! Binding heap and trail.
//!
//! Every variable slot is a heap cell. An unbound cell is a `Ref` pointing
//! at its own address; binding either writes a `Term` or redirects the cell
//! to an older cell. Each destructive write is recorded on the trail so
//! backtracking can restore the cell to its unbound state.

use tetralog_core::TermId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell {
    /// Redirection to another cell. A cell pointing at itself is unbound.
    Ref(u32),
    /// Bound to an interned term.
    Term(TermId),
}

/// Result of dereferencing a cell chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deref {
    Bound(TermId),
    /// Address of the representative unbound cell.
    Unbound(u32),
}

#[derive(Debug, Default)]
pub(crate) struct Heap {
    cells: Vec<Cell>,
    trail: Vec<u32>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Allocates `count` fresh unbound cells and returns the base address.
    pub fn alloc_frame(&mut self, count: u16) -> u32 {
        let base = self.len();
        for i in 0..u32::from(count) {
            self.cells.push(Cell::Ref(base + i));
        }
        base
    }

    /// Follows `Ref` chains until a term or a self-referential cell.
    ///
    /// Chains only ever point at older (lower) addresses, so dereferencing
    /// terminates.
    pub fn deref(&self, addr: u32) -> Deref {
        let mut at = addr;
        loop {
            match self.cells[at as usize] {
                Cell::Term(t) => return Deref::Bound(t),
                Cell::Ref(next) if next == at => return Deref::Unbound(at),
                Cell::Ref(next) => {
                    debug_assert!(next < at, "ref chain must point at older cells");
                    at = next;
                }
            }
        }
    }

    /// Binds an unbound cell to a term, recording the write on the trail.
    pub fn bind_term(&mut self, root: u32, term: TermId) {
        debug_assert_eq!(
            self.cells[root as usize],
            Cell::Ref(root),
            "bind target must be an unbound representative"
        );
        self.trail.push(root);
        self.cells[root as usize] = Cell::Term(term);
    }

    /// Redirects the younger unbound cell `from` at the older cell `to`.
    pub fn bind_ref(&mut self, from: u32, to: u32) {
        debug_assert!(from > to, "younger cell must point at older cell");
        debug_assert_eq!(
            self.cells[from as usize],
            Cell::Ref(from),
            "bind target must be an unbound representative"
        );
        self.trail.push(from);
        self.cells[from as usize] = Cell::Ref(to);
    }

    /// Unwinds trailed writes back to `mark`, restoring cells to unbound.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let addr = self.trail.pop().unwrap();
            self.cells[addr as usize] = Cell::Ref(addr);
        }
    }

    /// Discards cells allocated past `len`. Callers must have already
    /// unwound any trailed writes into the discarded region.
    pub fn truncate(&mut self, len: u32) {
        debug_assert!(len <= self.len());
        self.cells.truncate(len as usize);
    }

    /// Clears all cells and the trail, keeping allocated capacity.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.trail.clear();
    }
}
