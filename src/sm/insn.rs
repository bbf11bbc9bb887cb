use crate::ast::{BinOp, Identifier};
use std::fmt;

pub type SmProg = Vec<SmInsn>;

/// Storage class a source name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loc {
    /// i-th argument of the current function
    Arg(usize),
    /// i-th local slot of the current function; the flag marks `var` bindings
    Local(usize, bool),
    /// named global; the flag marks `var` bindings
    Global(Identifier, bool),
    /// callable with its label and arity; builtin labels start with '$'
    Fun(Identifier, usize),
}

impl Loc {
    pub fn is_mutable(&self) -> bool {
        match self {
            Self::Arg(_) => true,
            Self::Local(_, mutable) | Self::Global(_, mutable) => *mutable,
            Self::Fun(..) => false,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Arg(i) => write!(f, "Arg({i})"),
            Self::Local(i, _) => write!(f, "Loc({i})"),
            Self::Global(name, _) => write!(f, "Glb({name:?})"),
            Self::Fun(label, arity) => write!(f, "Fun({label:?}, {arity})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCond {
    Z,
    Nz,
}

impl fmt::Display for JumpCond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Z => write!(f, "z"),
            Self::Nz => write!(f, "nz"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmInsn {
    Const(i32),
    Binop(BinOp),
    Str(String),
    Array(usize),
    Sexp(Identifier, usize),
    Elem,
    Sta,
    Dup,
    Drop,
    Ld(Loc),
    Lda(Loc),
    St(Loc),
    Sti,
    Global(Identifier),
    Label(Identifier),
    Jmp(Identifier),
    CJmp(JumpCond, Identifier),
    Call(Identifier, usize),
    Begin(Identifier, usize, usize),
    End,
    Builtin(Identifier, usize),
}

impl fmt::Display for SmInsn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Const(n) => write!(f, "CONST {n}"),
            Self::Binop(op) => write!(f, "BINOP {op}"),
            Self::Str(s) => write!(f, "STRING {s:?}"),
            Self::Array(n) => write!(f, "ARRAY {n}"),
            Self::Sexp(tag, n) => write!(f, "SEXP {tag} {n}"),
            Self::Elem => write!(f, "ELEM"),
            Self::Sta => write!(f, "STA"),
            Self::Dup => write!(f, "DUP"),
            Self::Drop => write!(f, "DROP"),
            Self::Ld(loc) => write!(f, "LD {loc}"),
            Self::Lda(loc) => write!(f, "LDA {loc}"),
            Self::St(loc) => write!(f, "ST {loc}"),
            Self::Sti => write!(f, "STI"),
            Self::Global(name) => write!(f, "GLOBAL {name}"),
            Self::Label(l) => write!(f, "LABEL {l}"),
            Self::Jmp(l) => write!(f, "JMP {l}"),
            Self::CJmp(c, l) => write!(f, "CJMP {c} {l}"),
            Self::Call(label, n) => write!(f, "CALL {label} {n}"),
            Self::Begin(name, nargs, nlocals) => write!(f, "BEGIN {name} {nargs} {nlocals}"),
            Self::End => write!(f, "END"),
            Self::Builtin(name, n) => write!(f, "BUILTIN {name} {n}"),
        }
    }
}
