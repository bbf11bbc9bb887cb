use crate::ast::Pos;
use crate::lexer::Token;
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerParseError {
    ExpectedButGot(Token, Token),
    ExpectedIdentifierButGot(Token),
    UnexpectedToken(Token),
    BadFactor(Token),
    WrongLvalue,
    UnexpectedEof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub inner: InnerParseError,
    pub pos: Option<Pos>,
}

impl InnerParseError {
    pub fn at(self, pos: Option<Pos>) -> ParseError {
        ParseError { inner: self, pos }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)?;
        if let Some(pos) = self.pos {
            write!(f, " at {pos}")?;
        }
        Ok(())
    }
}

impl Display for InnerParseError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        use InnerParseError as PE;
        match self {
            PE::ExpectedButGot(expected, got) => {
                write!(f, "expected token {expected:?}, but got {got:?}")
            }
            PE::ExpectedIdentifierButGot(token) => {
                write!(f, "expected identifier, but got {token:?}")
            }
            PE::UnexpectedToken(t) => write!(f, "unexpected token {t:?}"),
            PE::BadFactor(t) => write!(f, "bad factor {t:?}"),
            PE::WrongLvalue => write!(f, "left side of := is not assignable"),
            PE::UnexpectedEof => write!(f, "reached unexpected EOF"),
        }
    }
}

impl std::error::Error for InnerParseError {}
impl std::error::Error for ParseError {}
