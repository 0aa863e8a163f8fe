//! Conjunctive query expression trees.
//!
//! Expressions arrive pre-built from an external query or rule builder;
//! the compiler classifies the terms and lowers the tree, it never parses
//! textual syntax.

use serde::{Deserialize, Serialize};

use tetralog_core::Term;

/// One position of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternTerm {
    /// Must equal the stored value at this position.
    Const(Term),
    /// Named variable: binds on first occurrence, unifies on re-occurrence.
    Var(String),
    /// Anonymous wildcard: matches anything, never retained in bindings.
    Any,
}

impl PatternTerm {
    pub fn var(name: impl Into<String>) -> Self {
        PatternTerm::Var(name.into())
    }

    pub fn constant(term: Term) -> Self {
        PatternTerm::Const(term)
    }

    pub fn is_const(&self) -> bool {
        matches!(self, PatternTerm::Const(_))
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        PatternTerm::Const(term)
    }
}

/// A graph-qualified triple pattern.
///
/// The graph defaults to the default graph; `in_graph` scopes the pattern
/// to a named graph (triggering module resolution if the name is unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
    pub graph: PatternTerm,
}

impl Pattern {
    pub fn new(
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: PatternTerm::Const(Term::DefaultGraph),
        }
    }

    pub fn in_graph(mut self, graph: impl Into<PatternTerm>) -> Self {
        self.graph = graph.into();
        self
    }

    /// Positions in textual order (subject, predicate, object, graph).
    pub fn positions(&self) -> [&PatternTerm; 4] {
        [&self.subject, &self.predicate, &self.object, &self.graph]
    }
}

/// A conjunctive query expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Pattern(Pattern),
    And(Vec<Expr>),
}

impl Expr {
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }
}

impl From<Pattern> for Expr {
    fn from(pattern: Pattern) -> Self {
        Expr::Pattern(pattern)
    }
}
