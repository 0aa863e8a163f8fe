//! Program format and compiled-artifact types for Tetralog.
//!
//! This crate contains:
//! - the closed instruction set (`Opcode`, `Operand`, `Instruction`)
//! - the compiled unit types (`Program`, `ClauseTable`, `CompiledQuery`)
//! - program disassembly (`dump`) and compact binary round-trip

pub mod dump;
pub mod program;

#[cfg(test)]
mod program_tests;

pub use dump::{dump_program, dump_query};
pub use program::{
    ClauseEntry, ClauseId, ClauseTable, CompiledQuery, FreeVar, Instruction, Opcode, Operand,
    Program, ProgramError,
};
