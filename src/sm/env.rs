use crate::ast::{Expr, Identifier, Pos};
use crate::sm::compile_error::{CompileError, Result};
use crate::sm::insn::Loc;
use std::collections::{HashMap, VecDeque};

/// Lexical symbol state. A clone of this value is captured for every hoisted
/// function, so nested bodies are later compiled against exactly the bindings
/// their definition site could see.
#[derive(Debug, Clone)]
pub struct SymState {
    scopes: Vec<HashMap<Identifier, Loc>>,
    depth: usize,
}

/// Scope depth of the program top level: `main`'s argument scope plus the
/// scope of the outermost `Scope` node. Names bound at this depth live in
/// `.data` rather than in a frame.
const TOP_LEVEL_DEPTH: usize = 2;

impl SymState {
    fn new() -> Self {
        let mut builtins = HashMap::new();
        for (name, arity) in [("read", 0), ("write", 1), ("length", 1)] {
            builtins.insert(name.to_owned(), Loc::Fun(format!("${name}"), arity));
        }
        Self {
            scopes: vec![builtins],
            depth: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.depth += 1;
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
        self.depth -= 1;
    }

    pub fn add(&mut self, name: &str, loc: Loc) {
        self.scopes
            .last_mut()
            .expect("symbol state has no scope")
            .insert(name.to_owned(), loc);
    }

    fn lookup(&self, name: &str) -> Option<&Loc> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn is_top_level(&self) -> bool {
        self.depth == TOP_LEVEL_DEPTH
    }
}

#[derive(Debug)]
pub struct PendingFun {
    pub label: Identifier,
    pub args: Vec<Identifier>,
    pub body: Expr,
    pub state: SymState,
}

/// Compile-time environment threaded through the AST → SM translation:
/// label generator, symbol state, per-function counters and the queue of
/// hoisted function bodies.
#[derive(Debug)]
pub struct Env {
    label_count: usize,
    pub syms: SymState,
    n_locals: usize,
    n_args: usize,
    pending: VecDeque<PendingFun>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            label_count: 0,
            syms: SymState::new(),
            n_locals: 0,
            n_args: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn fresh_label(&mut self) -> Identifier {
        let n = self.label_count;
        self.label_count += 1;
        format!("L{n}")
    }

    /// Allocates the label a function is called through. Top-level functions
    /// get a stable name, nested ones are disambiguated with a label id.
    pub fn fun_label(&mut self, name: &str) -> Identifier {
        if self.syms.is_top_level() {
            format!("L{name}")
        } else {
            let n = self.label_count;
            self.label_count += 1;
            format!("L{name}_{n}")
        }
    }

    /// Binds a scalar name in the current scope; returns true when the name
    /// went to a global.
    pub fn add_var(&mut self, name: &str, mutable: bool) -> bool {
        if self.syms.is_top_level() {
            self.syms.add(name, Loc::Global(name.to_owned(), mutable));
            true
        } else {
            let i = self.n_locals;
            self.n_locals += 1;
            self.syms.add(name, Loc::Local(i, mutable));
            false
        }
    }

    pub fn remember_fun(&mut self, label: Identifier, args: Vec<Identifier>, body: Expr) {
        let state = self.syms.clone();
        self.pending.push_back(PendingFun {
            label,
            args,
            body,
            state,
        });
    }

    pub fn pop_pending(&mut self) -> Option<PendingFun> {
        self.pending.pop_front()
    }

    /// Installs the captured symbol state and opens the argument scope;
    /// local numbering restarts for the new function.
    pub fn enter_function(&mut self, state: SymState, args: &[Identifier]) {
        self.syms = state;
        self.syms.enter_scope();
        for (i, arg) in args.iter().enumerate() {
            self.syms.add(arg, Loc::Arg(i));
        }
        self.n_locals = 0;
        self.n_args = args.len();
    }

    pub fn n_locals(&self) -> usize {
        self.n_locals
    }

    pub fn n_args(&self) -> usize {
        self.n_args
    }

    pub fn lookup_var(&self, name: &str, pos: Option<Pos>) -> Result<Loc> {
        match self.syms.lookup(name) {
            Some(loc) if loc.is_mutable() => Ok(loc.clone()),
            _ => Err(CompileError::NotAVariable(name.to_owned(), pos)),
        }
    }

    pub fn lookup_val(&self, name: &str, pos: Option<Pos>) -> Result<Loc> {
        match self.syms.lookup(name) {
            Some(loc) if !matches!(loc, Loc::Fun(..)) => Ok(loc.clone()),
            _ => Err(CompileError::NotAValue(name.to_owned(), pos)),
        }
    }

    pub fn lookup_fun(&self, name: &str, pos: Option<Pos>) -> Result<(Identifier, usize)> {
        match self.syms.lookup(name) {
            Some(Loc::Fun(label, arity)) => Ok((label.clone(), *arity)),
            _ => Err(CompileError::NotAFunction(name.to_owned(), pos)),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
