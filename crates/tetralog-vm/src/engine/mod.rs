//! Execution engine: heap, choice points, memo tables and the dispatch loop.

mod checkpoint;
mod error;
mod heap;
mod machine;
mod memo;
mod session;
mod trace;


pub use error::VmError;
pub use machine::{Bindings, Processor, ProcessorBuilder};
pub use memo::{EvalStats, Row};
pub use session::{Session, StepEvent};
pub use trace::{NoopTracer, PrintTracer, Tracer};
