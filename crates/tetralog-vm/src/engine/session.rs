//! Single-step evaluation driver.
//!
//! A session wraps a processor and exposes one-instruction-at-a-time
//! execution with register introspection, for REPLs and debuggers. A
//! memoized clause call counts as one step: the callee's derivation run
//! happens inside it.

use tetralog_bytecode::CompiledQuery;
use tetralog_core::QuadStore;

use super::error::VmError;
use super::machine::{Bindings, Processor, StepOutcome};
use super::memo::EvalStats;
use super::trace::NoopTracer;

/// Observable result of one session step.
#[derive(Debug)]
pub enum StepEvent {
    /// The machine advanced without anything to report.
    Running,
    /// A solution was produced; stepping further resumes the search.
    Solution(Bindings),
    /// The search space is exhausted; further steps keep returning this.
    Exhausted,
}

pub struct Session<'a> {
    processor: Processor<'a>,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a QuadStore, query: &'a CompiledQuery) -> Self {
        let mut processor = Processor::builder(store, query).build();
        processor.begin_run();
        Self { processor }
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> Result<StepEvent, VmError> {
        match self.processor.step_once(&mut NoopTracer)? {
            StepOutcome::Continue => Ok(StepEvent::Running),
            StepOutcome::Solution(bindings) => Ok(StepEvent::Solution(bindings)),
            StepOutcome::Exhausted => Ok(StepEvent::Exhausted),
            StepOutcome::Answer(_) => unreachable!("answer emitted outside a clause body"),
        }
    }

    /// Runs until the next solution or exhaustion.
    pub fn next_solution(&mut self) -> Result<Option<Bindings>, VmError> {
        loop {
            match self.step()? {
                StepEvent::Running => {}
                StepEvent::Solution(bindings) => return Ok(Some(bindings)),
                StepEvent::Exhausted => return Ok(None),
            }
        }
    }

    pub fn pc(&self) -> u16 {
        self.processor.pc()
    }

    pub fn choice_point_count(&self) -> usize {
        self.processor.choice_point_count()
    }

    pub fn heap_len(&self) -> u32 {
        self.processor.heap_len()
    }

    pub fn trail_len(&self) -> usize {
        self.processor.trail_len()
    }

    pub fn stats(&self) -> &EvalStats {
        self.processor.stats()
    }
}
