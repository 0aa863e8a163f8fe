//! Compilation driver: expression walking and transitive clause lowering.

use std::collections::HashMap;

use tetralog_bytecode::{ClauseId, ClauseTable, CompiledQuery, Opcode, Operand, Program};
use tetralog_core::Term;

use crate::compile::error::CompileError;
use crate::compile::emitter::Emitter;
use crate::compile::{call, pattern};
use crate::expr::{Expr, Pattern, PatternTerm};
use crate::module::{ClauseDef, Module, ModuleLoader};

/// Shared compilation state: the module being compiled against, the
/// loader for unknown graphs, and the clause table under construction.
pub(crate) struct Ctx<'m> {
    pub module: &'m mut Module,
    pub loader: &'m dyn ModuleLoader,
    pub clauses: ClauseTable,
    /// Clause ids per registered name, reserved before bodies compile so
    /// recursive references resolve.
    compiled: HashMap<String, Vec<ClauseId>>,
}

/// Compile a conjunctive query expression against a module.
///
/// Every clause transitively reachable from the expression is compiled
/// into the result's clause table. Unknown graphs consult the loader;
/// unknown predicates and malformed patterns fail fatally.
pub fn compile_query(
    module: &mut Module,
    loader: &dyn ModuleLoader,
    expr: &Expr,
) -> Result<CompiledQuery, CompileError> {
    let mut ctx = Ctx {
        module,
        loader,
        clauses: ClauseTable::new(),
        compiled: HashMap::new(),
    };

    let mut em = Emitter::new();
    compile_expr(&mut ctx, &mut em, expr)?;
    em.emit_nullary(Opcode::Emit);

    Ok(CompiledQuery {
        program: em.finish(),
        clauses: ctx.clauses,
    })
}

pub(crate) fn compile_expr(
    ctx: &mut Ctx<'_>,
    em: &mut Emitter,
    expr: &Expr,
) -> Result<(), CompileError> {
    match expr {
        Expr::And(conjuncts) => {
            for conjunct in conjuncts {
                compile_expr(ctx, em, conjunct)?;
            }
            Ok(())
        }
        Expr::Pattern(p) => compile_pattern(ctx, em, p),
    }
}

fn compile_pattern(ctx: &mut Ctx<'_>, em: &mut Emitter, p: &Pattern) -> Result<(), CompileError> {
    validate_pattern(p)?;
    resolve_graph(ctx, &p.graph)?;

    // A constant predicate naming a registered clause is a call; any other
    // predicate matches base facts.
    if let PatternTerm::Const(Term::NamedNode(iri)) = &p.predicate
        && ctx.module.has_clause(iri)
    {
        let ids = ensure_clauses(ctx, iri)?;
        return call::compile_call(ctx, em, p, &ids);
    }

    pattern::compile_edb_pattern(ctx, em, p)
}

fn validate_pattern(p: &Pattern) -> Result<(), CompileError> {
    for (pos, term) in ["subject", "predicate", "object", "graph"]
        .into_iter()
        .zip(p.positions())
    {
        if let PatternTerm::Const(t) = term {
            if t.is_variable() {
                return Err(CompileError::Structural(format!(
                    "{pos} position holds a variable wrapped as a constant: {t}"
                )));
            }
            if pos == "graph" && matches!(t, Term::Literal { .. }) {
                return Err(CompileError::Structural(
                    "graph position holds a literal".to_owned(),
                ));
            }
        }
    }
    Ok(())
}

/// Resolve a constant graph reference, importing through the loader when
/// the name is unknown. Variable/wildcard graphs enumerate at run time and
/// need no resolution.
fn resolve_graph(ctx: &mut Ctx<'_>, graph: &PatternTerm) -> Result<(), CompileError> {
    let PatternTerm::Const(Term::NamedNode(iri)) = graph else {
        return Ok(());
    };
    if ctx.module.is_known_graph(iri) {
        return Ok(());
    }
    let loaded = ctx
        .loader
        .load(iri)
        .map_err(|source| CompileError::Loader {
            name: iri.clone(),
            source,
        })?;
    ctx.module.import(loaded);
    Ok(())
}

/// Clause ids for every definition under a name, compiling bodies on
/// first reference. Ids are reserved before any body compiles so
/// recursive clauses find themselves.
pub(crate) fn ensure_clauses(
    ctx: &mut Ctx<'_>,
    name: &str,
) -> Result<Vec<ClauseId>, CompileError> {
    if let Some(ids) = ctx.compiled.get(name) {
        return Ok(ids.clone());
    }

    let defs: Vec<ClauseDef> = ctx
        .module
        .clause_defs(name)
        .ok_or_else(|| CompileError::ResourceNotFound {
            kind: "clause",
            name: name.to_owned(),
        })?
        .to_vec();

    let ids: Vec<ClauseId> = defs
        .iter()
        .map(|_| ctx.clauses.reserve(name, 2))
        .collect();
    ctx.compiled.insert(name.to_owned(), ids.clone());

    for (def, &id) in defs.iter().zip(&ids) {
        let program = compile_clause_body(ctx, def)?;
        ctx.clauses.fill(id, program);
    }
    Ok(ids)
}

fn compile_clause_body(ctx: &mut Ctx<'_>, def: &ClauseDef) -> Result<Program, CompileError> {
    let mut em = Emitter::new();

    // Head parameters occupy slots 0..arity. Constant parameters bind
    // their slot up front so answer rows carry them.
    for (i, param) in def.params.iter().enumerate() {
        let name = match param {
            PatternTerm::Var(n) => Some(n.as_str()),
            PatternTerm::Const(_) | PatternTerm::Any => None,
        };
        em.seed_param(i as u16, name);
    }
    for (i, param) in def.params.iter().enumerate() {
        if let PatternTerm::Const(t) = param {
            let id = ctx.module.store_mut().intern(t);
            em.emit(Opcode::LinkBind, Operand::Slot(i as u16), Operand::Const(id));
        }
    }

    compile_expr(ctx, &mut em, &def.body)?;
    em.emit_nullary(Opcode::Answer);
    Ok(em.finish())
}
