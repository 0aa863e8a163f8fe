//! Instruction emission and frame-slot allocation for one program unit.

use indexmap::IndexMap;

use tetralog_bytecode::{FreeVar, Instruction, Opcode, Operand, Program};
use tetralog_core::TermId;

/// A resolved caller-side argument: a constant or a frame slot.
#[derive(Clone, Copy, Debug)]
pub enum ArgOp {
    Const(TermId),
    Slot(u16),
}

impl From<ArgOp> for Operand {
    fn from(arg: ArgOp) -> Operand {
        match arg {
            ArgOp::Const(id) => Operand::Const(id),
            ArgOp::Slot(i) => Operand::Slot(i),
        }
    }
}

/// Builds one program: code buffer plus the unit's slot table.
pub struct Emitter {
    code: Vec<Instruction>,
    named: IndexMap<String, u16>,
    free: Vec<FreeVar>,
    next_slot: u16,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            named: IndexMap::new(),
            free: Vec::new(),
            next_slot: 0,
        }
    }

    /// Slot for a named variable; allocates and registers it as a free
    /// variable on first occurrence. Returns (slot, first_occurrence).
    pub fn named_slot(&mut self, name: &str) -> (u16, bool) {
        if let Some(&slot) = self.named.get(name) {
            return (slot, false);
        }
        let slot = self.alloc_slot();
        self.named.insert(name.to_owned(), slot);
        self.free.push(FreeVar {
            name: name.to_owned(),
            slot,
        });
        (slot, true)
    }

    /// Whether a named variable already has a slot (an "old" variable).
    pub fn is_bound(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Fresh hidden slot for an anonymous wildcard occurrence.
    pub fn hidden_slot(&mut self) -> u16 {
        self.alloc_slot()
    }

    /// Pre-seed a clause head parameter at a fixed slot.
    ///
    /// Parameters occupy slots `0..arity` and are always part of the
    /// unit's free variables (answer rows read them back).
    pub fn seed_param(&mut self, index: u16, name: Option<&str>) {
        debug_assert_eq!(self.next_slot, index, "params must be seeded in order");
        let slot = self.alloc_slot();
        let name = match name {
            Some(n) => {
                self.named.insert(n.to_owned(), slot);
                n.to_owned()
            }
            None => format!("_p{index}"),
        };
        self.free.push(FreeVar { name, slot });
    }

    fn alloc_slot(&mut self) -> u16 {
        let slot = self.next_slot;
        self.next_slot = self
            .next_slot
            .checked_add(1)
            .expect("frame exceeds slot capacity");
        slot
    }

    /// Append an instruction, returning its address.
    pub fn emit(&mut self, op: Opcode, a: Operand, b: Operand) -> u16 {
        let at = self.code.len() as u16;
        self.code.push(Instruction::new(op, a, b));
        at
    }

    pub fn emit_unary(&mut self, op: Opcode, a: Operand) -> u16 {
        self.emit(op, a, Operand::None)
    }

    pub fn emit_nullary(&mut self, op: Opcode) -> u16 {
        self.emit(op, Operand::None, Operand::None)
    }

    /// Address of the next instruction to be emitted.
    pub fn here(&self) -> u16 {
        self.code.len() as u16
    }

    /// Patch a previously emitted instruction's left operand with a
    /// now-known address.
    pub fn patch_addr(&mut self, at: u16, target: u16) {
        let instr = &mut self.code[at as usize];
        debug_assert!(
            matches!(instr.a, Operand::Addr(u16::MAX)),
            "patching an operand that is not an address placeholder"
        );
        instr.a = Operand::Addr(target);
    }

    /// Placeholder address operand, to be patched later.
    pub fn placeholder() -> Operand {
        Operand::Addr(u16::MAX)
    }

    pub fn finish(self) -> Program {
        Program {
            code: self.code,
            frame_size: self.next_slot,
            free_vars: self.free,
        }
    }
}
