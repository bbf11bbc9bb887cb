use crate::ast::Pos;
use std::str::Chars;

#[derive(Clone)]
pub struct Cursor<'a> {
    chars: Chars<'a>,
    line: u64,
    col: u64,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        let chars = s.chars();
        Self {
            chars,
            line: 1,
            col: 1,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_2nd(&self) -> Option<char> {
        // cheap to clone
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    pub fn take(&mut self) -> Option<char> {
        let c = self.chars.next();
        match c {
            Some('\n') => {
                self.line += 1;
                self.col = 1;
            }
            Some(_) => self.col += 1,
            None => (),
        }
        c
    }

    pub fn skip_if(&mut self, p: impl FnOnce(char) -> bool) -> bool {
        let hit = self.peek().filter(|c| p(*c)).is_some();
        if hit {
            self.take();
        }
        hit
    }

    pub fn bump_if(&mut self, c: char) -> bool {
        self.skip_if(|p| p == c)
    }

    pub fn get_pos(&self) -> Pos {
        Pos {
            line: self.line,
            col: self.col,
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.chars.as_str()
    }
}
