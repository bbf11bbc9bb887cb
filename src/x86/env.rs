use crate::ast::Identifier;
use crate::x86::asm::{InternedString, Opnd, NUM_STACK_REGS};
use std::collections::HashMap;

/// Code-generation environment: the compile-time mirror of the runtime
/// operand stack, plus the accumulated `.data` items and the per-label
/// stack snapshots that make control-flow joins sound.
#[derive(Debug)]
pub struct CodegenEnv {
    stack: Vec<Opnd>,
    stack_slots: usize,
    globals: Vec<Identifier>,
    strings: Vec<InternedString>,
    stack_map: HashMap<Identifier, Vec<Opnd>>,
    barrier: bool,
    fname: Identifier,
    n_locals: usize,
}

impl CodegenEnv {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            stack_slots: 0,
            globals: Vec::new(),
            strings: Vec::new(),
            stack_map: HashMap::new(),
            barrier: false,
            fname: Identifier::new(),
            n_locals: 0,
        }
    }

    /// Resets the per-function state on `BEGIN`.
    pub fn enter(&mut self, fname: &str, n_locals: usize) {
        self.stack.clear();
        self.stack_slots = 0;
        self.barrier = false;
        self.fname = fname.to_owned();
        self.n_locals = n_locals;
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }

    /// Bytes of frame the function needs for locals and operand spills.
    pub fn frame_size(&self) -> usize {
        (self.n_locals + self.stack_slots) * 4
    }

    /// Pushes a fresh compile-time value and returns the operand backing
    /// it: the next free register, or a spill slot above the locals once
    /// the four stack registers are taken.
    pub fn allocate(&mut self) -> Opnd {
        let opnd = match self.stack.last() {
            None => Opnd::R(0),
            Some(Opnd::S(n)) if *n >= 0 => Opnd::S(n + 1),
            Some(Opnd::R(i)) if i + 1 < NUM_STACK_REGS => Opnd::R(i + 1),
            Some(Opnd::R(_)) => Opnd::S(self.n_locals as i32),
            Some(_) => Opnd::S(0),
        };
        if let Opnd::S(n) = &opnd {
            self.stack_slots = self.stack_slots.max((n + 1) as usize);
        }
        self.stack.push(opnd.clone());
        opnd
    }

    pub fn pop(&mut self) -> Opnd {
        self.stack.pop().expect("symbolic stack underflow")
    }

    pub fn peek(&self) -> &Opnd {
        self.stack.last().expect("symbolic stack underflow")
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Registers holding live values below the top `n` stack positions;
    /// they must survive a call that consumes those `n` operands.
    pub fn live_registers(&self, n: usize) -> Vec<Opnd> {
        let keep = self
            .stack
            .len()
            .checked_sub(n)
            .expect("symbolic stack underflow");
        self.stack[..keep]
            .iter()
            .filter(|opnd| matches!(opnd, Opnd::R(_)))
            .cloned()
            .collect()
    }

    pub fn global(&mut self, name: &str) {
        if !self.globals.iter().any(|g| g == name) {
            self.globals.push(name.to_owned());
        }
    }

    /// Interns a string literal and returns the label of its `.string`
    /// entry; identical literals share one entry.
    pub fn string(&mut self, escaped: String) -> Identifier {
        if let Some(interned) = self.strings.iter().find(|s| s.escaped == escaped) {
            return interned.name.clone();
        }
        let name = format!("string_{}", self.strings.len());
        self.strings.push(InternedString {
            name: name.clone(),
            escaped,
        });
        name
    }

    /// Records the symbolic stack a jump target must start from.
    pub fn set_stack(&mut self, label: &str) {
        self.stack_map.insert(label.to_owned(), self.stack.clone());
    }

    /// Reinstates the stack recorded for a label reached over a barrier.
    pub fn retrieve_stack(&mut self, label: &str) {
        self.stack = self.stack_map.get(label).cloned().unwrap_or_default();
    }

    pub fn set_barrier(&mut self) {
        self.barrier = true;
    }

    pub fn drop_barrier(&mut self) -> bool {
        let was = self.barrier;
        self.barrier = false;
        was
    }

    pub fn into_data(self) -> (Vec<Identifier>, Vec<InternedString>) {
        (self.globals, self.strings)
    }
}

impl Default for CodegenEnv {
    fn default() -> Self {
        Self::new()
    }
}
