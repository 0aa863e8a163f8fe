//! Linear instruction programs and the compiled-query container.
//!
//! An instruction is an (operation, left operand, right operand) triple.
//! Operands reference interned constants, frame slots, trie index roots
//! (by term order), compiled clauses, or code addresses. The operation set
//! is closed: the machine dispatches through an exhaustive match, never a
//! runtime-extensible registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tetralog_core::{TermId, TermOrder};

/// Handle to a compiled clause in a [`ClauseTable`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ClauseId(pub u32);

impl std::fmt::Display for ClauseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// The closed operation set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Opcode {
    /// Set the trie cursor to an index root. Left: `Index(order)`.
    Root,
    /// Match a medial pattern position: descend one trie level through the
    /// argument if bound, else enumerate every child (choice point).
    /// Left: `Const` or `Slot`.
    Walk,
    /// Match the final pattern position against the terminal member set:
    /// membership test if bound, else enumerate members (choice point).
    /// Left: `Const` or `Slot`.
    Leaf,
    /// Allocate the callee's frame (all cells unbound) and set the callee
    /// base register. Left: `Clause`.
    Frame,
    /// Constant/constant argument link: equality check, fail on mismatch.
    /// Left and right: `Const`.
    LinkCheck,
    /// Constant/variable argument link: bind the constant into the cell if
    /// unbound, else check equality. Left: `Slot` or `Param`; right: `Const`.
    LinkBind,
    /// Variable/variable argument link: merge the two binding chains,
    /// pointing the younger cell at the older. Left: `Slot`; right: `Param`.
    LinkMerge,
    /// Invoke a linked clause through its memo table. Left: `Clause`.
    CallClause,
    /// First alternative of a chain: push a choice point resuming at the
    /// next alternative. Left: `Addr`.
    Try,
    /// Middle alternative: push the resumed choice point again, now aimed
    /// at the following alternative. Left: `Addr`.
    Retry,
    /// Last alternative: no choice point remains for this chain.
    Trust,
    /// Unconditional jump. Left: `Addr`.
    Jump,
    /// Clause-body success: record the parameter bindings as an answer row,
    /// then fail to enumerate further derivations.
    Answer,
    /// Top-level success: report the free-variable bindings through the
    /// caller's callback, then fail to enumerate further solutions.
    Emit,
}

/// One instruction operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Operand {
    None,
    /// An interned constant term.
    Const(TermId),
    /// A slot in the current environment frame.
    Slot(u16),
    /// A slot in the callee frame set up by the preceding `Frame`.
    Param(u16),
    /// A trie index root, named by its term order.
    Index(TermOrder),
    /// A compiled clause.
    Clause(ClauseId),
    /// A code address within the same program.
    Addr(u16),
}

/// One (operation, left, right) instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    pub a: Operand,
    pub b: Operand,
}

impl Instruction {
    pub fn new(op: Opcode, a: Operand, b: Operand) -> Self {
        Self { op, a, b }
    }

    pub fn nullary(op: Opcode) -> Self {
        Self::new(op, Operand::None, Operand::None)
    }

    pub fn unary(op: Opcode, a: Operand) -> Self {
        Self::new(op, a, Operand::None)
    }
}

/// A query-level variable retained in result bindings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FreeVar {
    pub name: String,
    pub slot: u16,
}

/// A compiled linear program.
///
/// `frame_size` counts every slot the program touches, named and hidden;
/// `free_vars` lists the retained query-level variables in first-occurrence
/// order. For clause programs the free variables are the head parameters,
/// occupying slots `0..arity`.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instruction>,
    pub frame_size: u16,
    pub free_vars: Vec<FreeVar>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// One compiled clause: a named program whose free variables are its head
/// parameters.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ClauseEntry {
    pub name: String,
    pub arity: u16,
    pub program: Program,
}

/// All clauses reachable from a compiled query, addressed by [`ClauseId`].
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ClauseTable {
    entries: Vec<ClauseEntry>,
}

impl ClauseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id before the entry's program exists (clauses can call
    /// each other recursively). The placeholder must be filled before
    /// execution.
    pub fn reserve(&mut self, name: &str, arity: u16) -> ClauseId {
        let id = ClauseId(self.entries.len() as u32);
        self.entries.push(ClauseEntry {
            name: name.to_owned(),
            arity,
            program: Program::default(),
        });
        id
    }

    pub fn fill(&mut self, id: ClauseId, program: Program) {
        self.entries[id.0 as usize].program = program;
    }

    pub fn get(&self, id: ClauseId) -> Option<&ClauseEntry> {
        self.entries.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &ClauseEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (ClauseId(i as u32), e))
    }
}

/// The compiled artifact for one query shape: its program plus every
/// transitively reachable compiled clause. Compiled once, reused across
/// evaluations.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub program: Program,
    pub clauses: ClauseTable,
}

impl CompiledQuery {
    /// Compact binary encoding.
    ///
    /// Constants reference the interner that compiled the query; an image
    /// is only meaningful alongside that interner's store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProgramError> {
        postcard::to_allocvec(self).map_err(ProgramError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProgramError> {
        postcard::from_bytes(bytes).map_err(ProgramError::Decode)
    }
}

/// Errors in program encode/decode.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("program encoding failed: {0}")]
    Encode(#[source] postcard::Error),

    #[error("program decoding failed: {0}")]
    Decode(#[source] postcard::Error),
}
