//! Human-readable program disassembly.
//!
//! One line per instruction, resolving constant operands through the
//! interner so dumps read like the query they came from.

use tetralog_core::TermInterner;

use crate::program::{CompiledQuery, Operand, Program};

/// Render a program with resolved constants.
pub fn dump_program(program: &Program, interner: &TermInterner) -> String {
    let mut out = String::new();
    for (pc, instr) in program.code.iter().enumerate() {
        let a = fmt_operand(&instr.a, interner);
        let b = fmt_operand(&instr.b, interner);
        let line = match (a, b) {
            (None, None) => format!("{pc:4}: {:?}\n", instr.op),
            (Some(a), None) => format!("{pc:4}: {:?} {a}\n", instr.op),
            (Some(a), Some(b)) => format!("{pc:4}: {:?} {a}, {b}\n", instr.op),
            (None, Some(b)) => format!("{pc:4}: {:?} _, {b}\n", instr.op),
        };
        out.push_str(&line);
    }
    if !program.free_vars.is_empty() {
        let vars: Vec<String> = program
            .free_vars
            .iter()
            .map(|v| format!("?{}={}", v.name, v.slot))
            .collect();
        out.push_str(&format!("; frame={} free=[{}]\n", program.frame_size, vars.join(" ")));
    }
    out
}

/// Render a full compiled query: the query program plus each clause.
pub fn dump_query(query: &CompiledQuery, interner: &TermInterner) -> String {
    let mut out = String::from("query:\n");
    out.push_str(&dump_program(&query.program, interner));
    for (id, entry) in query.clauses.iter() {
        out.push_str(&format!("{id} {}/{}:\n", entry.name, entry.arity));
        out.push_str(&dump_program(&entry.program, interner));
    }
    out
}

fn fmt_operand(operand: &Operand, interner: &TermInterner) -> Option<String> {
    match operand {
        Operand::None => None,
        Operand::Const(id) => Some(match interner.try_resolve(*id) {
            Some(term) => term.encode(),
            None => format!("#{}", id.as_u32()),
        }),
        Operand::Slot(i) => Some(format!("x{i}")),
        Operand::Param(i) => Some(format!("y{i}")),
        Operand::Index(order) => Some(format!("idx:{order}")),
        Operand::Clause(id) => Some(id.to_string()),
        Operand::Addr(a) => Some(format!("@{a}")),
    }
}
