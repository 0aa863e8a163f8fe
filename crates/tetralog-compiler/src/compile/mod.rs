//! Lowering of query expressions into linear instruction programs.
//!
//! The pipeline per program unit (query or clause body):
//! - classify each pattern position (constant / anonymous / new variable /
//!   old variable) and allocate frame slots
//! - base-fact patterns lower to a `Root` + `Walk`* + `Leaf` walk over the
//!   index order the store prefers for the pattern's bound positions
//! - clause-call patterns lower to `Frame` + argument links + `CallClause`,
//!   wrapped in a try/retry/trust chain when several definitions apply
//! - the unit ends in `Emit` (query) or `Answer` (clause body)

mod call;
mod compiler;
mod emitter;
mod error;
mod pattern;

#[cfg(test)]
mod compile_tests;

pub use compiler::compile_query;
pub use error::CompileError;
