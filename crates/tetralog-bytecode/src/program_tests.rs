//! Unit tests for the program container and its binary round-trip.

use tetralog_core::{Term, TermInterner, TermOrder};

use crate::dump::{dump_program, dump_query};
use crate::program::{
    ClauseTable, CompiledQuery, FreeVar, Instruction, Opcode, Operand, Program,
};

fn sample_program(interner: &mut TermInterner) -> Program {
    let p = interner.intern(&Term::named("http://example.org/p"));
    Program {
        code: vec![
            Instruction::unary(Opcode::Root, Operand::Index(TermOrder([1, 0, 2, 3]))),
            Instruction::unary(Opcode::Walk, Operand::Const(p)),
            Instruction::unary(Opcode::Walk, Operand::Slot(0)),
            Instruction::unary(Opcode::Leaf, Operand::Slot(1)),
            Instruction::nullary(Opcode::Emit),
        ],
        frame_size: 2,
        free_vars: vec![
            FreeVar {
                name: "x".to_owned(),
                slot: 0,
            },
            FreeVar {
                name: "y".to_owned(),
                slot: 1,
            },
        ],
    }
}

#[test]
fn compiled_query_binary_round_trip() {
    let mut interner = TermInterner::new();
    let program = sample_program(&mut interner);

    let mut clauses = ClauseTable::new();
    let id = clauses.reserve("reachable", 2);
    clauses.fill(
        id,
        Program {
            code: vec![Instruction::nullary(Opcode::Answer)],
            frame_size: 2,
            free_vars: vec![
                FreeVar {
                    name: "a".to_owned(),
                    slot: 0,
                },
                FreeVar {
                    name: "b".to_owned(),
                    slot: 1,
                },
            ],
        },
    );

    let query = CompiledQuery { program, clauses };
    let bytes = query.to_bytes().unwrap();
    let back = CompiledQuery::from_bytes(&bytes).unwrap();
    assert_eq!(query, back);
}

#[test]
fn decode_rejects_garbage() {
    assert!(CompiledQuery::from_bytes(&[0xff; 3]).is_err());
}

#[test]
fn clause_table_reserve_then_fill() {
    let mut table = ClauseTable::new();
    let a = table.reserve("a", 2);
    let b = table.reserve("b", 2);
    assert_ne!(a, b);
    assert_eq!(table.len(), 2);

    let filled = Program {
        code: vec![Instruction::nullary(Opcode::Answer)],
        frame_size: 2,
        free_vars: vec![],
    };
    table.fill(b, filled.clone());
    assert_eq!(table.get(b).unwrap().program, filled);
    assert!(table.get(a).unwrap().program.is_empty());
}

#[test]
fn dump_resolves_constants() {
    let mut interner = TermInterner::new();
    let program = sample_program(&mut interner);
    let text = dump_program(&program, &interner);

    assert!(text.contains("<http://example.org/p>"));
    assert!(text.contains("Root idx:psog"));
    assert!(text.contains("x0"));
    assert!(text.contains("free=[?x=0 ?y=1]"));
}

#[test]
fn dump_query_lists_clauses() {
    let mut interner = TermInterner::new();
    let program = sample_program(&mut interner);
    let mut clauses = ClauseTable::new();
    clauses.reserve("reachable", 2);
    let query = CompiledQuery { program, clauses };

    let text = dump_query(&query, &interner);
    assert!(text.contains("c0 reachable/2:"));
}
