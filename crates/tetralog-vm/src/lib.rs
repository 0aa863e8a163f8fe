//! Runtime processor for compiled Tetralog programs.
//!
//! The processor executes a [`tetralog_bytecode::Program`] against a
//! [`tetralog_core::QuadStore`], enumerating every binding of the query's
//! free variables through chronological backtracking. Clause calls are
//! memoized per argument shape, so a clause body is derived at most once
//! for each distinct call pattern within a processor's lifetime.

pub mod engine;

pub use engine::{
    Bindings, EvalStats, NoopTracer, PrintTracer, Processor, ProcessorBuilder, Session, StepEvent,
    Tracer, VmError,
};
