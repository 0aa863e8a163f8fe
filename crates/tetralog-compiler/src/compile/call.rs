//! Clause-call (IDB) lowering: argument linking and alternative chains.
//!
//! A call passes (subject, object) to a binary clause. Each argument pair
//! compiles to exactly one linking instruction chosen from the caller and
//! callee classifications: constant/constant checks, constant/variable
//! binds, variable/variable merges. When several definitions share the
//! clause name they form a try/retry/trust chain; a single definition
//! compiles to straight-line code with no choice point.

use tetralog_bytecode::{ClauseId, Opcode, Operand};

use crate::compile::emitter::{ArgOp, Emitter};
use crate::compile::error::CompileError;
use crate::compile::compiler::Ctx;
use crate::expr::{Pattern, PatternTerm};
use crate::module::ClauseDef;

pub(crate) fn compile_call(
    ctx: &mut Ctx<'_>,
    em: &mut Emitter,
    p: &Pattern,
    ids: &[ClauseId],
) -> Result<(), CompileError> {
    // Caller arguments allocate in textual order: subject, then object.
    let args = [
        caller_arg(ctx, em, &p.subject),
        caller_arg(ctx, em, &p.object),
    ];

    let name = ctx
        .clauses
        .get(ids[0])
        .expect("reserved clause id")
        .name
        .clone();
    let defs: Vec<ClauseDef> = ctx
        .module
        .clause_defs(&name)
        .expect("clause defs exist for reserved ids")
        .to_vec();
    debug_assert_eq!(defs.len(), ids.len());

    if defs.len() == 1 {
        emit_alternative(ctx, em, &defs[0], ids[0], args);
        return Ok(());
    }

    // try/retry/trust chain. Each alternative ends by jumping past the
    // chain; each Try/Retry operand aims at the next alternative's head.
    let mut resume_patch = em.emit_unary(Opcode::Try, Emitter::placeholder());
    let mut exits = Vec::with_capacity(defs.len());
    let last = defs.len() - 1;

    for (i, (def, &id)) in defs.iter().zip(ids).enumerate() {
        if i > 0 {
            em.patch_addr(resume_patch, em.here());
            if i < last {
                resume_patch = em.emit_unary(Opcode::Retry, Emitter::placeholder());
            } else {
                em.emit_nullary(Opcode::Trust);
            }
        }
        emit_alternative(ctx, em, def, id, args);
        if i < last {
            exits.push(em.emit_unary(Opcode::Jump, Emitter::placeholder()));
        }
    }

    let after = em.here();
    for exit in exits {
        em.patch_addr(exit, after);
    }
    Ok(())
}

fn caller_arg(ctx: &mut Ctx<'_>, em: &mut Emitter, term: &PatternTerm) -> ArgOp {
    match term {
        PatternTerm::Const(t) => ArgOp::Const(ctx.module.store_mut().intern(t)),
        PatternTerm::Var(name) => ArgOp::Slot(em.named_slot(name).0),
        PatternTerm::Any => ArgOp::Slot(em.hidden_slot()),
    }
}

fn emit_alternative(
    ctx: &mut Ctx<'_>,
    em: &mut Emitter,
    def: &ClauseDef,
    id: ClauseId,
    args: [ArgOp; 2],
) {
    em.emit_unary(Opcode::Frame, Operand::Clause(id));
    for (i, (arg, param)) in args.iter().zip(&def.params).enumerate() {
        match (arg, param) {
            (ArgOp::Const(c), PatternTerm::Const(d)) => {
                let d = ctx.module.store_mut().intern(d);
                em.emit(Opcode::LinkCheck, Operand::Const(*c), Operand::Const(d));
            }
            (ArgOp::Const(c), PatternTerm::Var(_) | PatternTerm::Any) => {
                em.emit(Opcode::LinkBind, Operand::Param(i as u16), Operand::Const(*c));
            }
            (ArgOp::Slot(s), PatternTerm::Const(d)) => {
                let d = ctx.module.store_mut().intern(d);
                em.emit(Opcode::LinkBind, Operand::Slot(*s), Operand::Const(d));
            }
            (ArgOp::Slot(s), PatternTerm::Var(_) | PatternTerm::Any) => {
                em.emit(Opcode::LinkMerge, Operand::Slot(*s), Operand::Param(i as u16));
            }
        }
    }
    em.emit_unary(Opcode::CallClause, Operand::Clause(id));
}
