//! Tetralog: an embeddable logic query engine over quad stores.
//!
//! Facts are (subject, predicate, object, graph) quads held in trie
//! indexes; conjunctive queries compile to linear instruction programs a
//! backtracking processor executes, with memoized clause calls for
//! rule-defined predicates.
//!
//! # Example
//!
//! ```
//! use tetralog_lib::{Expr, Module, NoLoader, Pattern, PatternTerm, Query, Term};
//!
//! let mut module = Module::new("main");
//! module.add_fact(&Term::named("ada"), &Term::named("knows"), &Term::named("grace"));
//!
//! let expr = Expr::from(Pattern::new(
//!     PatternTerm::var("who"),
//!     Term::named("knows"),
//!     PatternTerm::var("whom"),
//! ));
//! let query = Query::compile(&mut module, &NoLoader, &expr).unwrap();
//! let found = query.all_bindings(module.store()).unwrap();
//! assert_eq!(found[0]["who"], Term::named("ada"));
//! ```

pub mod query;


pub use query::{Error, Query};

pub use tetralog_bytecode::{CompiledQuery, dump_query};
pub use tetralog_compiler::{
    ClauseDef, CompileError, Expr, LoadError, Module, ModuleLoader, NoLoader, Pattern,
    PatternTerm, StaticLoader, compile_query,
};
pub use tetralog_core::{QuadStore, Term, TermId, TermInterner, TermOrder};
pub use tetralog_vm::{Bindings, EvalStats, Processor, Session, StepEvent, Tracer, VmError};
