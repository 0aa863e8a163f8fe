//! Module registry: named facts (EDB), clauses (IDB), and imports.
//!
//! A module resolves a predicate to either a base index or a clause at
//! compile time. Importing a module merges its clause set and its facts
//! into the importer, tagging the imported default-graph facts with the
//! imported module's name so patterns can still scope to them.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use thiserror::Error;

use tetralog_core::{GRAPH, QuadStore, Term};

use crate::expr::{Expr, PatternTerm};
use crate::compile::CompileError;

/// One definition of a clause. Multiple definitions under the same name
/// are call alternatives (a try/retry/trust chain at every call site).
///
/// Clauses are binary: a pattern whose predicate names the clause calls it
/// with (subject, object) as arguments.
#[derive(Debug, Clone)]
pub struct ClauseDef {
    pub params: [PatternTerm; 2],
    pub body: Expr,
}

/// A named collection of facts, clauses, and imports.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    store: QuadStore,
    clauses: IndexMap<String, Vec<ClauseDef>>,
    /// Graph names resolvable without consulting the loader.
    known_graphs: BTreeSet<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut known_graphs = BTreeSet::new();
        known_graphs.insert(name.clone());
        Self {
            name,
            store: QuadStore::new(),
            clauses: IndexMap::new(),
            known_graphs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &QuadStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QuadStore {
        &mut self.store
    }

    /// Add a fact in the default graph.
    pub fn add_fact(&mut self, subject: &Term, predicate: &Term, object: &Term) -> bool {
        self.store
            .insert_quad(subject, predicate, object, &Term::DefaultGraph)
    }

    /// Add a fact in a named graph, marking that graph as known.
    pub fn add_fact_in(
        &mut self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        graph: &Term,
    ) -> bool {
        if let Term::NamedNode(iri) = graph {
            self.known_graphs.insert(iri.clone());
        }
        self.store.insert_quad(subject, predicate, object, graph)
    }

    /// Register a clause definition under a name.
    ///
    /// Head parameters must be constants, variables, or wildcards; a
    /// variable term wrapped in `Const` is malformed.
    pub fn add_clause(
        &mut self,
        name: impl Into<String>,
        params: [PatternTerm; 2],
        body: Expr,
    ) -> Result<(), CompileError> {
        for p in &params {
            if let PatternTerm::Const(t) = p
                && t.is_variable()
            {
                return Err(CompileError::Structural(format!(
                    "clause head parameter is a variable wrapped as a constant: {t}"
                )));
            }
        }
        self.clauses
            .entry(name.into())
            .or_default()
            .push(ClauseDef { params, body });
        Ok(())
    }

    pub fn clause_defs(&self, name: &str) -> Option<&[ClauseDef]> {
        self.clauses.get(name).map(Vec::as_slice)
    }

    pub fn has_clause(&self, name: &str) -> bool {
        self.clauses.contains_key(name)
    }

    pub fn is_known_graph(&self, iri: &str) -> bool {
        self.known_graphs.contains(iri)
    }

    /// Merge an imported module's signature into this one.
    ///
    /// Clause sets extend the local registry; the import's default-graph
    /// facts are re-tagged with the import's name, named-graph facts keep
    /// their graph.
    pub fn import(&mut self, imported: Module) {
        let import_graph = Term::named(imported.name.clone());
        let their_interner = imported.store.interner();
        for quad in imported.store.scan(&[None, None, None, None]) {
            let subject = their_interner.resolve(quad[0]).clone();
            let predicate = their_interner.resolve(quad[1]).clone();
            let object = their_interner.resolve(quad[2]).clone();
            let graph = match their_interner.resolve(quad[GRAPH]) {
                Term::DefaultGraph => import_graph.clone(),
                other => other.clone(),
            };
            self.store
                .insert_quad(&subject, &predicate, &object, &graph);
        }
        for (name, defs) in imported.clauses {
            self.clauses.entry(name).or_default().extend(defs);
        }
        self.known_graphs.insert(imported.name);
        self.known_graphs.extend(imported.known_graphs);
    }
}

/// Errors surfaced by a module loader.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("module not found: {0}")]
    NotFound(String),

    #[error("module load rejected: {0}")]
    Rejected(String),
}

/// Injected capability resolving a graph/module name to a loaded module.
///
/// The core never fetches or parses anything itself; compilation calls
/// this boundary when a pattern references an unknown graph.
pub trait ModuleLoader {
    fn load(&self, name: &str) -> Result<Module, LoadError>;
}

/// Loader over a fixed set of pre-built modules. Mostly for tests and
/// embedders that assemble everything up front.
#[derive(Debug, Default)]
pub struct StaticLoader {
    modules: HashMap<String, Module>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, module: Module) -> Self {
        self.register(module);
        self
    }

    pub fn register(&mut self, module: Module) {
        self.modules.insert(module.name().to_owned(), module);
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.to_owned()))
    }
}

/// Loader that knows no modules. The default when a query never leaves
/// its own module.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLoader;

impl ModuleLoader for NoLoader {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        Err(LoadError::NotFound(name.to_owned()))
    }
}
