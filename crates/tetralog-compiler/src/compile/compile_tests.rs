use tetralog_bytecode::{ClauseId, Opcode, Operand, Program};
use tetralog_core::{SPOG, Term, TermId, TermOrder};

use crate::compile::{CompileError, compile_query};
use crate::expr::{Expr, Pattern, PatternTerm};
use crate::module::{Module, NoLoader, StaticLoader};

fn facts_module(facts: &[(&str, &str, &str)]) -> Module {
    let mut module = Module::new("main");
    for (s, p, o) in facts {
        module.add_fact(&Term::named(*s), &Term::named(*p), &Term::named(*o));
    }
    module
}

fn id(module: &Module, term: &Term) -> TermId {
    module
        .store()
        .interner()
        .lookup(term)
        .unwrap_or_else(|| panic!("term not interned: {term}"))
}

fn ops(program: &Program) -> Vec<Opcode> {
    program.code.iter().map(|i| i.op).collect()
}

#[test]
fn single_pattern_walks_the_preferred_order() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("p"),
        PatternTerm::var("y"),
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let program = &compiled.program;

    // Bound predicate first: the psog order puts the constant before the
    // enumerating positions.
    let psog = TermOrder::for_pattern([false, true, false, false]);
    let p = id(&module, &Term::named("p"));
    let g = id(&module, &Term::DefaultGraph);
    assert_eq!(program.code[0].a, Operand::Index(psog));
    assert_eq!(
        ops(program),
        vec![
            Opcode::Root,
            Opcode::Walk,
            Opcode::Walk,
            Opcode::Walk,
            Opcode::Leaf,
            Opcode::Emit,
        ]
    );
    // Walks follow index order (p, s, o) while slots follow textual
    // order (x before y).
    assert_eq!(program.code[1].a, Operand::Const(p));
    assert_eq!(program.code[2].a, Operand::Slot(0));
    assert_eq!(program.code[3].a, Operand::Slot(1));
    assert_eq!(program.code[4].a, Operand::Const(g));

    assert_eq!(program.frame_size, 2);
    let names: Vec<&str> = program.free_vars.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    // The preferred order got materialized on the store.
    assert!(module.store().get_index(psog).is_some());
}

#[test]
fn old_variable_reuses_its_slot_and_counts_as_bound() {
    let mut module = facts_module(&[("a", "p", "b"), ("b", "p", "c")]);
    let expr = Expr::and([
        Expr::from(Pattern::new(
            PatternTerm::var("x"),
            Term::named("p"),
            PatternTerm::var("y"),
        )),
        Expr::from(Pattern::new(
            PatternTerm::var("y"),
            Term::named("p"),
            PatternTerm::var("z"),
        )),
    ]);
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let program = &compiled.program;

    // The second pattern sees y already bound, so subject and predicate
    // both walk first: the canonical spog order.
    assert_eq!(program.code[5].op, Opcode::Root);
    assert_eq!(program.code[5].a, Operand::Index(SPOG));
    // y reuses slot 1; z allocates slot 2.
    assert_eq!(program.code[6].a, Operand::Slot(1));
    assert_eq!(program.code[8].a, Operand::Slot(2));

    assert_eq!(program.frame_size, 3);
    let names: Vec<&str> = program.free_vars.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
}

#[test]
fn wildcard_takes_a_hidden_slot() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("p"),
        PatternTerm::Any,
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let program = &compiled.program;

    assert_eq!(program.frame_size, 2);
    let names: Vec<&str> = program.free_vars.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x"]);
}

#[test]
fn unknown_constant_predicate_is_fatal() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("no-such-predicate"),
        PatternTerm::var("y"),
    ));
    let err = compile_query(&mut module, &NoLoader, &expr).unwrap_err();
    assert!(matches!(
        err,
        CompileError::ResourceNotFound { kind: "predicate", .. }
    ));
}

#[test]
fn variable_wrapped_as_constant_is_rejected() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(Pattern::new(
        PatternTerm::Const(Term::variable("v")),
        Term::named("p"),
        PatternTerm::var("y"),
    ));
    let err = compile_query(&mut module, &NoLoader, &expr).unwrap_err();
    assert!(matches!(err, CompileError::Structural(_)));
}

#[test]
fn literal_graph_is_rejected() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(
        Pattern::new(
            PatternTerm::var("x"),
            Term::named("p"),
            PatternTerm::var("y"),
        )
        .in_graph(Term::literal("not a graph")),
    );
    let err = compile_query(&mut module, &NoLoader, &expr).unwrap_err();
    assert!(matches!(err, CompileError::Structural(_)));
}

#[test]
fn unknown_graph_consults_the_loader() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let mut lib = Module::new("lib");
    lib.add_fact(&Term::named("c"), &Term::named("p"), &Term::named("d"));
    let loader = StaticLoader::new().with(lib);

    let expr = Expr::from(
        Pattern::new(
            PatternTerm::var("x"),
            Term::named("p"),
            PatternTerm::var("y"),
        )
        .in_graph(Term::named("lib")),
    );
    let compiled = compile_query(&mut module, &loader, &expr).unwrap();

    // The import is merged and its default-graph facts re-tagged.
    assert!(module.is_known_graph("lib"));
    let lib_graph = id(&module, &Term::named("lib"));
    assert_eq!(compiled.program.code[4].a, Operand::Const(lib_graph));
    let c = id(&module, &Term::named("c"));
    let p = id(&module, &Term::named("p"));
    let d = id(&module, &Term::named("d"));
    assert!(module.store().contains([c, p, d, lib_graph]));
}

#[test]
fn unknown_graph_without_loader_fails() {
    let mut module = facts_module(&[("a", "p", "b")]);
    let expr = Expr::from(
        Pattern::new(
            PatternTerm::var("x"),
            Term::named("p"),
            PatternTerm::var("y"),
        )
        .in_graph(Term::named("nowhere")),
    );
    let err = compile_query(&mut module, &NoLoader, &expr).unwrap_err();
    assert!(matches!(err, CompileError::Loader { .. }));
}

fn edge_body() -> Expr {
    Expr::from(Pattern::new(
        PatternTerm::var("S"),
        Term::named("p"),
        PatternTerm::var("O"),
    ))
}

#[test]
fn single_definition_call_compiles_without_a_chain() {
    let mut module = facts_module(&[("a", "p", "b")]);
    module
        .add_clause(
            "edge",
            [PatternTerm::var("S"), PatternTerm::var("O")],
            edge_body(),
        )
        .unwrap();

    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("edge"),
        PatternTerm::var("y"),
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();

    assert_eq!(
        ops(&compiled.program),
        vec![
            Opcode::Frame,
            Opcode::LinkMerge,
            Opcode::LinkMerge,
            Opcode::CallClause,
            Opcode::Emit,
        ]
    );
    assert_eq!(compiled.program.code[1].a, Operand::Slot(0));
    assert_eq!(compiled.program.code[1].b, Operand::Param(0));
    assert_eq!(compiled.program.code[2].a, Operand::Slot(1));
    assert_eq!(compiled.program.code[2].b, Operand::Param(1));

    assert_eq!(compiled.clauses.len(), 1);
    let entry = compiled.clauses.get(ClauseId(0)).unwrap();
    assert_eq!(entry.name, "edge");
    assert_eq!(entry.arity, 2);
    // Body: parameters at slots 0..2, walk, Answer at the end.
    assert_eq!(entry.program.code.last().unwrap().op, Opcode::Answer);
    let names: Vec<&str> = entry.program.free_vars.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["S", "O"]);
}

#[test]
fn multi_definition_call_builds_a_try_retry_trust_chain() {
    let mut module = facts_module(&[("a", "p", "b")]);
    for _ in 0..3 {
        module
            .add_clause(
                "edge",
                [PatternTerm::var("S"), PatternTerm::var("O")],
                edge_body(),
            )
            .unwrap();
    }

    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("edge"),
        PatternTerm::var("y"),
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let code = &compiled.program.code;

    // 0: Try -> second alternative
    // 1..5: Frame/LinkMerge/LinkMerge/CallClause, 5: Jump -> after chain
    // 6: Retry -> third alternative
    // 7..11: alternative two, 11: Jump -> after chain
    // 12: Trust, 13..17: alternative three
    // 17: Emit
    assert_eq!(code[0].op, Opcode::Try);
    assert_eq!(code[0].a, Operand::Addr(6));
    assert_eq!(code[5].op, Opcode::Jump);
    assert_eq!(code[5].a, Operand::Addr(17));
    assert_eq!(code[6].op, Opcode::Retry);
    assert_eq!(code[6].a, Operand::Addr(12));
    assert_eq!(code[11].op, Opcode::Jump);
    assert_eq!(code[11].a, Operand::Addr(17));
    assert_eq!(code[12].op, Opcode::Trust);
    assert_eq!(code[17].op, Opcode::Emit);

    // One compiled clause per definition, all under the same name.
    assert_eq!(compiled.clauses.len(), 3);
    assert_eq!(code[4].a, Operand::Clause(ClauseId(0)));
    assert_eq!(code[10].a, Operand::Clause(ClauseId(1)));
    assert_eq!(code[16].a, Operand::Clause(ClauseId(2)));
}

#[test]
fn constant_arguments_link_by_check_and_bind() {
    let mut module = facts_module(&[("k", "p", "b")]);
    module
        .add_clause(
            "edge",
            [
                PatternTerm::Const(Term::named("k")),
                PatternTerm::var("O"),
            ],
            edge_body(),
        )
        .unwrap();

    // edge("k2", ?y): constant caller argument against a constant
    // parameter checks; the variable pair merges.
    let expr = Expr::from(Pattern::new(
        Term::named("k2"),
        Term::named("edge"),
        PatternTerm::var("y"),
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let code = &compiled.program.code;
    let k = id(&module, &Term::named("k"));
    let k2 = id(&module, &Term::named("k2"));

    assert_eq!(code[1].op, Opcode::LinkCheck);
    assert_eq!(code[1].a, Operand::Const(k2));
    assert_eq!(code[1].b, Operand::Const(k));
    assert_eq!(code[2].op, Opcode::LinkMerge);

    // The constant head parameter binds its own slot in the body prologue.
    let entry = compiled.clauses.get(ClauseId(0)).unwrap();
    assert_eq!(entry.program.code[0].op, Opcode::LinkBind);
    assert_eq!(entry.program.code[0].a, Operand::Slot(0));
    assert_eq!(entry.program.code[0].b, Operand::Const(k));
}

#[test]
fn bound_caller_variable_binds_the_parameter() {
    let mut module = facts_module(&[("a", "p", "b")]);
    module
        .add_clause(
            "edge",
            [
                PatternTerm::Const(Term::named("a")),
                PatternTerm::var("O"),
            ],
            edge_body(),
        )
        .unwrap();

    // ?x is bound by the first pattern, so the constant parameter links
    // against its slot.
    let expr = Expr::and([
        Expr::from(Pattern::new(
            PatternTerm::var("x"),
            Term::named("p"),
            PatternTerm::var("y"),
        )),
        Expr::from(Pattern::new(
            PatternTerm::var("x"),
            Term::named("edge"),
            PatternTerm::var("z"),
        )),
    ]);
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();
    let code = &compiled.program.code;
    let a = id(&module, &Term::named("a"));

    // After the five pattern instructions: Frame, LinkBind, LinkMerge,
    // CallClause, Emit.
    assert_eq!(code[6].op, Opcode::LinkBind);
    assert_eq!(code[6].a, Operand::Slot(0));
    assert_eq!(code[6].b, Operand::Const(a));
    assert_eq!(code[7].op, Opcode::LinkMerge);
}

#[test]
fn recursive_clause_reserves_before_compiling() {
    let mut module = facts_module(&[("a", "p", "b"), ("b", "p", "c")]);
    module
        .add_clause(
            "reach",
            [PatternTerm::var("S"), PatternTerm::var("O")],
            edge_body(),
        )
        .unwrap();
    module
        .add_clause(
            "reach",
            [PatternTerm::var("S"), PatternTerm::var("O")],
            Expr::and([
                Expr::from(Pattern::new(
                    PatternTerm::var("S"),
                    Term::named("p"),
                    PatternTerm::var("M"),
                )),
                Expr::from(Pattern::new(
                    PatternTerm::var("M"),
                    Term::named("reach"),
                    PatternTerm::var("O"),
                )),
            ]),
        )
        .unwrap();

    let expr = Expr::from(Pattern::new(
        PatternTerm::var("x"),
        Term::named("reach"),
        PatternTerm::var("y"),
    ));
    let compiled = compile_query(&mut module, &NoLoader, &expr).unwrap();

    assert_eq!(compiled.clauses.len(), 2);
    // The recursive body calls back into the same pair of definitions.
    let rec = compiled.clauses.get(ClauseId(1)).unwrap();
    let calls: Vec<Operand> = rec
        .program
        .code
        .iter()
        .filter(|i| i.op == Opcode::CallClause)
        .map(|i| i.a)
        .collect();
    assert_eq!(calls, vec![Operand::Clause(ClauseId(0)), Operand::Clause(ClauseId(1))]);
    // Both alternatives' programs are filled.
    for (_, entry) in compiled.clauses.iter() {
        assert!(!entry.program.is_empty());
    }
}
