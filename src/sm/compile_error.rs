use crate::ast::{Identifier, Pos};
use std::{error, fmt};

pub type Result<T> = std::result::Result<T, CompileError>;

/// A name failed to resolve to the kind of entity its use site requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    NotAVariable(Identifier, Option<Pos>),
    NotAValue(Identifier, Option<Pos>),
    NotAFunction(Identifier, Option<Pos>),
}

impl CompileError {
    fn parts(&self) -> (&Identifier, &'static str, &Option<Pos>) {
        match self {
            Self::NotAVariable(name, pos) => (name, "variable", pos),
            Self::NotAValue(name, pos) => (name, "value", pos),
            Self::NotAFunction(name, pos) => (name, "function", pos),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (name, kind, pos) = self.parts();
        write!(f, "the name {name:?} does not designate a {kind}")?;
        if let Some(pos) = pos {
            write!(f, " at {pos}")?;
        }
        Ok(())
    }
}

impl error::Error for CompileError {}
