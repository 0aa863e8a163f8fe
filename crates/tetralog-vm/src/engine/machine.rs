//! The processor: fetch/dispatch loop, unification, backtracking and
//! memoized clause calls.

use std::rc::Rc;

use indexmap::IndexMap;

use tetralog_bytecode::{ClauseEntry, ClauseId, CompiledQuery, Opcode, Operand, Program};
use tetralog_core::{QuadStore, Term, TermId, TrieNode};

use super::checkpoint::{Checkpoint, Resume};
use super::error::VmError;
use super::heap::{Deref, Heap};
use super::memo::{EvalStats, KeyArg, MemoEntry, MemoKey, MemoTable, Row};
use super::trace::{NoopTracer, Tracer};

/// One solution: free-variable name to bound term, in declaration order.
pub type Bindings = IndexMap<String, Term>;

/// What a single dispatched instruction produced.
#[derive(Debug)]
pub(crate) enum StepOutcome {
    /// Nothing observable; keep stepping.
    Continue,
    /// A top-level solution was emitted; the processor has already
    /// backtracked past it.
    Solution(Bindings),
    /// A clause-body answer row was recorded; only seen by the nested
    /// derivation loop inside `CallClause`.
    Answer(Row),
    /// No choice point remains in the current run.
    Exhausted,
}

/// Outcome of one opcode handler.
enum Flow {
    Cont,
    Fail,
}

/// Resolved `Walk`/`Leaf` argument.
enum Probe {
    Key(TermId),
    Enumerate(u32),
}

/// Configures a [`Processor`].
pub struct ProcessorBuilder<'a> {
    store: &'a QuadStore,
    query: &'a CompiledQuery,
}

impl<'a> ProcessorBuilder<'a> {
    pub fn build(self) -> Processor<'a> {
        Processor {
            store: self.store,
            query: self.query,
            heap: Heap::new(),
            cps: Vec::new(),
            memo: MemoTable::default(),
            stats: EvalStats::default(),
            code: &self.query.program,
            pc: 0,
            env: 0,
            callee: 0,
            cursor: None,
            floor: 0,
            run_arity: 0,
            exhausted: true,
        }
    }
}

/// Backtracking abstract machine over a quad store.
///
/// A processor is built once per (store, compiled query) pair and may run
/// [`Processor::evaluate`] any number of times; the memo table and
/// statistics persist across evaluations, while heap, trail and choice
/// points are reset per run.
pub struct Processor<'a> {
    store: &'a QuadStore,
    query: &'a CompiledQuery,
    heap: Heap,
    cps: Vec<Checkpoint<'a>>,
    memo: MemoTable,
    stats: EvalStats,
    /// Program currently executing: the query program, or a clause body
    /// during a nested derivation run.
    code: &'a Program,
    pc: u16,
    /// Base address of the current environment frame.
    env: u32,
    /// Base address of the frame set up by the latest `Frame`.
    callee: u32,
    cursor: Option<&'a TrieNode>,
    /// Choice points below this depth belong to an enclosing run and are
    /// off-limits to the current one.
    floor: usize,
    /// Parameter count of the clause whose body is running.
    run_arity: u16,
    exhausted: bool,
}

impl<'a> Processor<'a> {
    pub fn builder(store: &'a QuadStore, query: &'a CompiledQuery) -> ProcessorBuilder<'a> {
        ProcessorBuilder { store, query }
    }

    /// Enumerates every solution, invoking `on_solution` per binding set.
    /// Returns the number of solutions.
    pub fn evaluate(
        &mut self,
        on_solution: &mut dyn FnMut(&Bindings),
    ) -> Result<usize, VmError> {
        self.evaluate_with(on_solution, &mut NoopTracer)
    }

    /// [`Processor::evaluate`] with a tracer observing every event.
    pub fn evaluate_with<T: Tracer>(
        &mut self,
        on_solution: &mut dyn FnMut(&Bindings),
        tracer: &mut T,
    ) -> Result<usize, VmError> {
        self.begin_run();
        let mut count = 0;
        loop {
            match self.step_once(tracer)? {
                StepOutcome::Continue => {}
                StepOutcome::Solution(bindings) => {
                    on_solution(&bindings);
                    count += 1;
                }
                StepOutcome::Exhausted => return Ok(count),
                StepOutcome::Answer(_) => unreachable!("answer emitted outside a clause body"),
            }
        }
    }

    /// Resets per-run state (heap, trail, choice points, registers) while
    /// keeping the memo table and statistics.
    pub(crate) fn begin_run(&mut self) {
        self.heap.reset();
        self.cps.clear();
        self.code = &self.query.program;
        self.pc = 0;
        self.callee = 0;
        self.cursor = None;
        self.floor = 0;
        self.run_arity = 0;
        self.exhausted = false;
        self.env = self.heap.alloc_frame(self.code.frame_size);
    }

    /// Fetches and dispatches one instruction.
    pub(crate) fn step_once<T: Tracer>(&mut self, tracer: &mut T) -> Result<StepOutcome, VmError> {
        if self.exhausted {
            return Ok(StepOutcome::Exhausted);
        }
        let instr = self.code.code[self.pc as usize];
        tracer.on_instruction(self.pc, &instr);
        self.stats.steps += 1;
        self.pc += 1;

        let flow = match instr.op {
            Opcode::Root => {
                let Operand::Index(order) = instr.a else {
                    panic!("Root expects an index operand");
                };
                let index = self
                    .store
                    .get_index(order)
                    .ok_or(VmError::UnknownIndex(order))?;
                self.cursor = Some(index.root());
                Flow::Cont
            }
            Opcode::Walk => {
                let node = self.cursor.unwrap_or_else(|| panic!("Walk without cursor"));
                match self.probe(instr.a) {
                    Probe::Key(key) => match node.child(key) {
                        Some(child) => {
                            self.cursor = Some(child);
                            Flow::Cont
                        }
                        None => Flow::Fail,
                    },
                    Probe::Enumerate(slot) => {
                        self.push_checkpoint(
                            Resume::Branch {
                                iter: node.children(),
                                slot,
                            },
                            tracer,
                        );
                        Flow::Fail
                    }
                }
            }
            Opcode::Leaf => {
                let node = self.cursor.unwrap_or_else(|| panic!("Leaf without cursor"));
                match self.probe(instr.a) {
                    Probe::Key(key) => {
                        if node.has_member(key) {
                            Flow::Cont
                        } else {
                            Flow::Fail
                        }
                    }
                    Probe::Enumerate(slot) => {
                        self.push_checkpoint(
                            Resume::Members {
                                iter: node.members(),
                                slot,
                            },
                            tracer,
                        );
                        Flow::Fail
                    }
                }
            }
            Opcode::Frame => {
                let Operand::Clause(id) = instr.a else {
                    panic!("Frame expects a clause operand");
                };
                let entry = self.clause_entry(id)?;
                self.callee = self.heap.alloc_frame(entry.program.frame_size);
                Flow::Cont
            }
            Opcode::LinkCheck => {
                let (Operand::Const(left), Operand::Const(right)) = (instr.a, instr.b) else {
                    panic!("LinkCheck expects two constants");
                };
                if left == right { Flow::Cont } else { Flow::Fail }
            }
            Opcode::LinkBind => {
                let Operand::Const(value) = instr.b else {
                    panic!("LinkBind expects a constant right operand");
                };
                let addr = self.place(instr.a);
                match self.heap.deref(addr) {
                    Deref::Bound(t) => {
                        if t == value {
                            Flow::Cont
                        } else {
                            Flow::Fail
                        }
                    }
                    Deref::Unbound(root) => {
                        self.heap.bind_term(root, value);
                        tracer.on_bind(root, value);
                        Flow::Cont
                    }
                }
            }
            Opcode::LinkMerge => {
                let a = self.place(instr.a);
                let b = self.place(instr.b);
                if self.unify(a, b, tracer) {
                    Flow::Cont
                } else {
                    Flow::Fail
                }
            }
            Opcode::CallClause => {
                let Operand::Clause(id) = instr.a else {
                    panic!("CallClause expects a clause operand");
                };
                self.call_clause(id, tracer)?
            }
            Opcode::Try | Opcode::Retry => {
                let Operand::Addr(addr) = instr.a else {
                    panic!("Try/Retry expects an address operand");
                };
                self.push_checkpoint(Resume::Alt { addr: Some(addr) }, tracer);
                Flow::Cont
            }
            Opcode::Trust => Flow::Cont,
            Opcode::Jump => {
                let Operand::Addr(addr) = instr.a else {
                    panic!("Jump expects an address operand");
                };
                self.pc = addr;
                Flow::Cont
            }
            Opcode::Answer => {
                let row = self.collect_row();
                self.backtrack(tracer);
                return Ok(StepOutcome::Answer(row));
            }
            Opcode::Emit => {
                let bindings = self.collect_bindings();
                self.stats.solutions += 1;
                tracer.on_solution();
                self.backtrack(tracer);
                return Ok(StepOutcome::Solution(bindings));
            }
        };

        match flow {
            Flow::Cont => Ok(StepOutcome::Continue),
            Flow::Fail => {
                if self.backtrack(tracer) {
                    Ok(StepOutcome::Continue)
                } else {
                    Ok(StepOutcome::Exhausted)
                }
            }
        }
    }

    /// Restores the newest viable choice point and applies its next
    /// alternative. Returns false (and marks the run exhausted) when none
    /// remains above the floor.
    fn backtrack<T: Tracer>(&mut self, tracer: &mut T) -> bool {
        self.stats.backtracks += 1;
        loop {
            if self.cps.len() <= self.floor {
                self.exhausted = true;
                return false;
            }
            tracer.on_backtrack(self.cps.len());

            let (trail_mark, heap_mark, env, callee, cursor, cont) = {
                let cp = self.cps.last().unwrap();
                (cp.trail_mark, cp.heap_mark, cp.env, cp.callee, cp.cursor, cp.pc)
            };
            self.heap.undo_to(trail_mark);
            self.heap.truncate(heap_mark);
            self.env = env;
            self.callee = callee;
            self.cursor = cursor;

            enum Picked<'a> {
                Branch(u32, TermId, &'a TrieNode),
                Member(u32, TermId),
                Row(Rc<Vec<Row>>, usize, u32, u16),
                Alt(u16),
                Spent,
            }

            let picked = {
                let cp = self.cps.last_mut().unwrap();
                match &mut cp.resume {
                    Resume::Branch { iter, slot } => match iter.next() {
                        Some((&key, child)) => Picked::Branch(*slot, key, child),
                        None => Picked::Spent,
                    },
                    Resume::Members { iter, slot } => match iter.next() {
                        Some(&key) => Picked::Member(*slot, key),
                        None => Picked::Spent,
                    },
                    Resume::Rows { rows, next, base, arity } => {
                        if *next < rows.len() {
                            let at = *next;
                            *next += 1;
                            Picked::Row(rows.clone(), at, *base, *arity)
                        } else {
                            Picked::Spent
                        }
                    }
                    Resume::Alt { addr } => match addr.take() {
                        Some(target) => Picked::Alt(target),
                        None => Picked::Spent,
                    },
                }
            };

            match picked {
                Picked::Spent => {
                    self.cps.pop();
                }
                Picked::Branch(slot, key, child) => {
                    self.heap.bind_term(slot, key);
                    tracer.on_bind(slot, key);
                    self.cursor = Some(child);
                    self.pc = cont;
                    return true;
                }
                Picked::Member(slot, key) => {
                    self.heap.bind_term(slot, key);
                    tracer.on_bind(slot, key);
                    self.pc = cont;
                    return true;
                }
                Picked::Row(rows, at, base, arity) => {
                    if self.apply_row(&rows[at], base, arity, tracer) {
                        self.pc = cont;
                        return true;
                    }
                    // Row conflicts with bindings seeded by the caller's
                    // links; the loop re-restores and tries the next one.
                }
                Picked::Alt(target) => {
                    // Single alternative consumed; the checkpoint is spent.
                    self.cps.pop();
                    self.pc = target;
                    return true;
                }
            }
        }
    }

    /// Executes a clause call through the memo table.
    fn call_clause<T: Tracer>(&mut self, id: ClauseId, tracer: &mut T) -> Result<Flow, VmError> {
        let entry = self.clause_entry(id)?;
        let arity = entry.arity;
        let base = self.callee;

        // Unbound arguments are keyed by the first parameter position whose
        // cell they alias, so edge(?x,?x) and edge(?u,?v) cache separately.
        let mut args = Vec::with_capacity(arity as usize);
        let mut roots: Vec<Option<u32>> = Vec::with_capacity(arity as usize);
        for i in 0..arity {
            match self.heap.deref(base + u32::from(i)) {
                Deref::Bound(t) => {
                    args.push(KeyArg::In(t));
                    roots.push(None);
                }
                Deref::Unbound(root) => {
                    let first = roots
                        .iter()
                        .position(|&r| r == Some(root))
                        .unwrap_or(i as usize);
                    args.push(KeyArg::Out(first as u16));
                    roots.push(Some(root));
                }
            }
        }
        let key = MemoKey {
            clause: id,
            args: args.into_boxed_slice(),
        };

        let rows = match self.memo.get(&key) {
            Some(MemoEntry::Complete(rows)) => {
                self.stats.memo_hits += 1;
                tracer.on_memo_hit(id);
                rows.clone()
            }
            Some(MemoEntry::InProgress) => return Ok(Flow::Fail),
            None => {
                self.memo.begin(key.clone());
                self.stats.note_body_run(id);
                tracer.on_call(id);
                let rows = Rc::new(self.derive_clause(entry, base, tracer)?);
                self.memo.complete(&key, rows.clone());
                rows
            }
        };

        self.push_checkpoint(
            Resume::Rows {
                rows,
                next: 0,
                base,
                arity,
            },
            tracer,
        );
        Ok(Flow::Fail)
    }

    /// Runs a clause body to exhaustion in a nested run, collecting every
    /// answer row. The callee frame at `base` doubles as the body's
    /// environment; all bindings the run made are unwound before return.
    fn derive_clause<T: Tracer>(
        &mut self,
        entry: &'a ClauseEntry,
        base: u32,
        tracer: &mut T,
    ) -> Result<Vec<Row>, VmError> {
        let saved = (
            self.code,
            self.pc,
            self.env,
            self.callee,
            self.cursor,
            self.floor,
            self.run_arity,
        );
        let trail_mark = self.heap.trail_len();
        let heap_mark = self.heap.len();

        self.code = &entry.program;
        self.pc = 0;
        self.env = base;
        self.cursor = None;
        self.floor = self.cps.len();
        self.run_arity = entry.arity;
        self.exhausted = false;

        let mut rows = Vec::new();
        loop {
            match self.step_once(tracer)? {
                StepOutcome::Continue => {}
                StepOutcome::Answer(row) => rows.push(row),
                StepOutcome::Exhausted => break,
                StepOutcome::Solution(_) => unreachable!("emit inside a clause body"),
            }
        }

        self.heap.undo_to(trail_mark);
        self.heap.truncate(heap_mark);
        (
            self.code,
            self.pc,
            self.env,
            self.callee,
            self.cursor,
            self.floor,
            self.run_arity,
        ) = saved;
        self.exhausted = false;
        Ok(rows)
    }

    /// Unifies the answer row into the callee frame. Bound caller
    /// arguments must agree with the row's values.
    fn apply_row<T: Tracer>(&mut self, row: &Row, base: u32, arity: u16, tracer: &mut T) -> bool {
        debug_assert_eq!(row.len(), arity as usize);
        for (i, value) in row.iter().enumerate() {
            let Some(term) = value else { continue };
            let addr = base + i as u32;
            match self.heap.deref(addr) {
                Deref::Bound(t) => {
                    if t != *term {
                        return false;
                    }
                }
                Deref::Unbound(root) => {
                    self.heap.bind_term(root, *term);
                    tracer.on_bind(root, *term);
                }
            }
        }
        true
    }

    fn unify<T: Tracer>(&mut self, a: u32, b: u32, tracer: &mut T) -> bool {
        match (self.heap.deref(a), self.heap.deref(b)) {
            (Deref::Bound(x), Deref::Bound(y)) => x == y,
            (Deref::Bound(x), Deref::Unbound(root)) | (Deref::Unbound(root), Deref::Bound(x)) => {
                self.heap.bind_term(root, x);
                tracer.on_bind(root, x);
                true
            }
            (Deref::Unbound(ra), Deref::Unbound(rb)) => {
                if ra != rb {
                    let (younger, older) = if ra > rb { (ra, rb) } else { (rb, ra) };
                    self.heap.bind_ref(younger, older);
                }
                true
            }
        }
    }

    fn push_checkpoint<T: Tracer>(&mut self, resume: Resume<'a>, tracer: &mut T) {
        self.cps.push(Checkpoint {
            pc: self.pc,
            env: self.env,
            callee: self.callee,
            cursor: self.cursor,
            trail_mark: self.heap.trail_len(),
            heap_mark: self.heap.len(),
            resume,
        });
        tracer.on_choice_point(self.cps.len());
    }

    /// Resolves a `Walk`/`Leaf` argument to a concrete key or an
    /// enumeration over the unbound representative.
    fn probe(&self, operand: Operand) -> Probe {
        match operand {
            Operand::Const(t) => Probe::Key(t),
            Operand::Slot(i) => match self.heap.deref(self.env + u32::from(i)) {
                Deref::Bound(t) => Probe::Key(t),
                Deref::Unbound(root) => Probe::Enumerate(root),
            },
            other => panic!("pattern operand must be Const or Slot, got {other:?}"),
        }
    }

    /// Resolves a `Slot`/`Param` operand to a heap address.
    fn place(&self, operand: Operand) -> u32 {
        match operand {
            Operand::Slot(i) => self.env + u32::from(i),
            Operand::Param(i) => self.callee + u32::from(i),
            other => panic!("link operand must be Slot or Param, got {other:?}"),
        }
    }

    fn clause_entry(&self, id: ClauseId) -> Result<&'a ClauseEntry, VmError> {
        let entry = self.query.clauses.get(id).ok_or(VmError::UnknownClause(id))?;
        if entry.program.is_empty() {
            return Err(VmError::UnfilledClause(id));
        }
        Ok(entry)
    }

    /// Reads the head parameters of the running clause body into a row.
    fn collect_row(&self) -> Row {
        (0..self.run_arity)
            .map(|i| match self.heap.deref(self.env + u32::from(i)) {
                Deref::Bound(t) => Some(t),
                Deref::Unbound(_) => None,
            })
            .collect()
    }

    /// Resolves the query's free variables into result bindings. Variables
    /// left unbound by this derivation are omitted.
    fn collect_bindings(&self) -> Bindings {
        let mut bindings = Bindings::with_capacity(self.code.free_vars.len());
        for fv in &self.code.free_vars {
            if let Deref::Bound(t) = self.heap.deref(self.env + u32::from(fv.slot)) {
                bindings.insert(fv.name.clone(), self.store.interner().resolve(t).clone());
            }
        }
        bindings
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub(crate) fn pc(&self) -> u16 {
        self.pc
    }

    pub(crate) fn choice_point_count(&self) -> usize {
        self.cps.len()
    }

    pub(crate) fn heap_len(&self) -> u32 {
        self.heap.len()
    }

    pub(crate) fn trail_len(&self) -> usize {
        self.heap.trail_len()
    }
}
