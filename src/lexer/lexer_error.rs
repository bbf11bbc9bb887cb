use crate::ast::Pos;
use std::{error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerLexError {
    UnexpectedChar(char),
    BadConstant(String),
    BadEscape(char),
    UnterminatedString,
    UnterminatedComment,
    BadOperator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    inner: InnerLexError,
    pos: Pos,
}

impl LexError {
    pub fn get_pos(&self) -> Pos {
        self.pos
    }
}

impl InnerLexError {
    pub(super) fn at(self, pos: Pos) -> LexError {
        LexError { inner: self, pos }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.inner, self.pos)
    }
}

impl fmt::Display for InnerLexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(c) => write!(f, "unexpected character: {c}"),
            Self::BadConstant(s) => write!(f, "bad integer constant: {s}"),
            Self::BadEscape(c) => write!(f, "bad escape sequence: \\{c}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::BadOperator(s) => write!(f, "bad operator: {s}"),
        }
    }
}

impl error::Error for InnerLexError {}
impl error::Error for LexError {}
