//! Execution tracing hooks.

use tetralog_bytecode::{ClauseId, Instruction};
use tetralog_core::TermId;

/// Observer of processor events. All hooks default to no-ops; implement
/// the ones you care about.
pub trait Tracer {
    fn on_instruction(&mut self, _pc: u16, _instr: &Instruction) {}
    fn on_bind(&mut self, _addr: u32, _term: TermId) {}
    fn on_choice_point(&mut self, _depth: usize) {}
    fn on_backtrack(&mut self, _depth: usize) {}
    fn on_call(&mut self, _clause: ClauseId) {}
    fn on_memo_hit(&mut self, _clause: ClauseId) {}
    fn on_solution(&mut self) {}
}

/// The default tracer: observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Prints every event to stderr. Useful when debugging compiled programs.
#[derive(Debug, Default)]
pub struct PrintTracer;

impl Tracer for PrintTracer {
    fn on_instruction(&mut self, pc: u16, instr: &Instruction) {
        eprintln!("[{pc:4}] {:?} {:?} {:?}", instr.op, instr.a, instr.b);
    }

    fn on_bind(&mut self, addr: u32, term: TermId) {
        eprintln!("       bind h{addr} <- t{}", term.as_u32());
    }

    fn on_choice_point(&mut self, depth: usize) {
        eprintln!("       choice point (depth {depth})");
    }

    fn on_backtrack(&mut self, depth: usize) {
        eprintln!("       backtrack (depth {depth})");
    }

    fn on_call(&mut self, clause: ClauseId) {
        eprintln!("       call {clause}");
    }

    fn on_memo_hit(&mut self, clause: ClauseId) {
        eprintln!("       memo hit {clause}");
    }

    fn on_solution(&mut self) {
        eprintln!("       solution");
    }
}
