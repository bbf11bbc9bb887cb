use crate::ast::Pos;
use crate::lexer::{PosToken, Token};
use crate::parser::{InnerParseError, Result};

#[derive(Debug)]
pub struct Cursor<'a> {
    tokens: &'a [PosToken],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [PosToken]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    pub fn bump(&mut self) {
        self.position += 1;
    }

    pub fn bump_if(&mut self, t: &Token) -> bool {
        let condition = self.peek() == Some(t);
        if condition {
            self.bump();
        }
        condition
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Position of the upcoming token, or of the last one at end of input.
    pub fn get_pos(&self) -> Option<Pos> {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|t| t.pos)
    }

    pub fn expect(&mut self, t: &Token) -> Result<()> {
        let pos = self.get_pos();
        let next = self.next_or_error()?;
        if next == t {
            Ok(())
        } else {
            let next = next.clone();
            Err(InnerParseError::ExpectedButGot(t.clone(), next).at(pos))
        }
    }

    pub fn peek_or_error(&self) -> Result<&Token> {
        let pos = self.get_pos();
        self.peek().ok_or(InnerParseError::UnexpectedEof.at(pos))
    }

    pub fn next_or_error(&mut self) -> Result<&Token> {
        let pos = self.get_pos();
        let next = self
            .tokens
            .get(self.position)
            .ok_or(InnerParseError::UnexpectedEof.at(pos))?;
        self.position += 1;
        Ok(&next.token)
    }
}
