//! Tetralog compiler: module resolution and program emission.
//!
//! This crate provides the compilation pipeline for Tetralog queries:
//! - `expr` - the conjunctive query expression tree (built by callers,
//!   never parsed from text here)
//! - `module` - the Module/Clause registry and the injected module-loader
//!   boundary
//! - `compile` - lowering expressions into linear instruction programs

pub mod compile;
pub mod expr;
pub mod module;


pub use compile::{CompileError, compile_query};
pub use expr::{Expr, Pattern, PatternTerm};
pub use module::{ClauseDef, LoadError, Module, ModuleLoader, NoLoader, StaticLoader};
