//! Base-fact (EDB) pattern lowering.
//!
//! A pattern compiles to a walk over one trie index: `Root` selects the
//! index whose order puts the pattern's bound positions first, then one
//! `Walk` per medial position and a final `Leaf`. Unbound medial positions
//! enumerate every child at run time — the only nondeterminism a single
//! pattern introduces.

use tetralog_bytecode::{Opcode, Operand};
use tetralog_core::{GRAPH, TermOrder};

use crate::compile::emitter::{ArgOp, Emitter};
use crate::compile::error::CompileError;
use crate::compile::compiler::Ctx;
use crate::expr::{Pattern, PatternTerm};

pub(crate) fn compile_edb_pattern(
    ctx: &mut Ctx<'_>,
    em: &mut Emitter,
    p: &Pattern,
) -> Result<(), CompileError> {
    // An unknown constant predicate with no clause behind it is fatal;
    // other constants merely fail to match at run time.
    if let PatternTerm::Const(t) = &p.predicate {
        let id = ctx.module.store_mut().intern(t);
        if !ctx.module.store().has_predicate(id) {
            return Err(CompileError::ResourceNotFound {
                kind: "predicate",
                name: t.encode(),
            });
        }
    }

    // Bound positions, judged before this pattern allocates anything:
    // constants and variables some earlier pattern already bound.
    let positions = p.positions();
    let mut bound = [false; 4];
    for (i, term) in positions.iter().enumerate() {
        bound[i] = match term {
            PatternTerm::Const(_) => true,
            PatternTerm::Var(name) => em.is_bound(name),
            PatternTerm::Any => false,
        };
    }

    let order = TermOrder::for_pattern(bound);
    ctx.module.store_mut().ensure_order(order);

    // Slots allocate in textual order so free-variable order tracks first
    // textual occurrence, not index order.
    let mut args: [Option<ArgOp>; 4] = [None; 4];
    for (i, term) in positions.iter().enumerate() {
        args[i] = Some(match term {
            PatternTerm::Const(t) => ArgOp::Const(ctx.module.store_mut().intern(t)),
            PatternTerm::Var(name) => ArgOp::Slot(em.named_slot(name).0),
            PatternTerm::Any => ArgOp::Slot(em.hidden_slot()),
        });
    }

    em.emit_unary(Opcode::Root, Operand::Index(order));
    for (depth, &pos) in order.0.iter().enumerate() {
        let arg = args[pos as usize].expect("argument resolved above");
        let op = if depth < GRAPH { Opcode::Walk } else { Opcode::Leaf };
        em.emit_unary(op, arg.into());
    }
    Ok(())
}
