//! The compile-once, evaluate-many query handle.

use thiserror::Error;

use tetralog_bytecode::{CompiledQuery, ProgramError, dump_query};
use tetralog_compiler::{CompileError, Expr, Module, ModuleLoader, compile_query};
use tetralog_core::QuadStore;
use tetralog_vm::{Bindings, Processor, Session, VmError};

/// Anything that can go wrong between an expression and its solutions.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Run(#[from] VmError),

    #[error(transparent)]
    Format(#[from] ProgramError),
}

/// A compiled query: the program for one expression shape plus every
/// clause it transitively calls.
///
/// Compilation happens once; the handle evaluates against any store whose
/// interner produced the program's constants — in practice, the module it
/// was compiled against, which compilation may have grown through imports
/// and materialized indexes.
#[derive(Debug, Clone)]
pub struct Query {
    compiled: CompiledQuery,
}

impl Query {
    /// Compile an expression against a module.
    ///
    /// Unknown graph references resolve through `loader` and import into
    /// `module`; the module's store also gains any trie orders the
    /// compiled patterns prefer.
    pub fn compile(
        module: &mut Module,
        loader: &dyn ModuleLoader,
        expr: &Expr,
    ) -> Result<Self, Error> {
        let compiled = compile_query(module, loader, expr)?;
        Ok(Self { compiled })
    }

    pub fn compiled(&self) -> &CompiledQuery {
        &self.compiled
    }

    /// A processor bound to this query and a store. Reuse it across
    /// evaluations to keep its clause memo tables warm.
    pub fn processor<'a>(&'a self, store: &'a QuadStore) -> Processor<'a> {
        Processor::builder(store, &self.compiled).build()
    }

    /// A single-step evaluation session.
    pub fn session<'a>(&'a self, store: &'a QuadStore) -> Session<'a> {
        Session::new(store, &self.compiled)
    }

    /// One-shot evaluation collecting every solution.
    pub fn all_bindings(&self, store: &QuadStore) -> Result<Vec<Bindings>, Error> {
        let mut processor = self.processor(store);
        let mut out = Vec::new();
        processor.evaluate(&mut |b| out.push(b.clone()))?;
        Ok(out)
    }

    /// Disassembly with constants resolved through the store's interner.
    pub fn dump(&self, store: &QuadStore) -> String {
        dump_query(&self.compiled, store.interner())
    }

    /// Compact binary image of the compiled artifact.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.compiled.to_bytes()?)
    }

    /// Rebuild a query from [`Query::to_bytes`] output. Only meaningful
    /// alongside the store that compiled it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            compiled: CompiledQuery::from_bytes(bytes)?,
        })
    }
}
