mod cursor;
mod lexer_error;
#[cfg(test)]
mod lexer_tests;
mod token;

use cursor::Cursor;
pub use lexer_error::{InnerLexError, LexError};
pub use token::{PosToken, Token};

pub type Tokens = Vec<PosToken>;

fn lex_mcharop2(first: char, second: char) -> Result<Token, InnerLexError> {
    match (first, second) {
        (':', '=') => Ok(Token::Assign),
        ('=', '=') => Ok(Token::IsEqual),
        ('!', '=') => Ok(Token::IsNotEqual),
        ('<', '=') => Ok(Token::IsLessThanOrEqual),
        ('>', '=') => Ok(Token::IsGreaterThanOrEqual),
        ('&', '&') => Ok(Token::LogicalAnd),
        ('|', '|') => Ok(Token::LogicalOr),
        _ => Err(InnerLexError::BadOperator(format!("{first}{second}"))),
    }
}

fn lex_mcharoperator(cursor: &mut Cursor) -> Result<Token, InnerLexError> {
    let first = cursor.take().expect("Is always Some");
    let second = cursor.peek();

    if let Some(second) = second {
        let op = lex_mcharop2(first, second);
        if op.is_ok() {
            cursor.take();
            return op;
        }
    }

    // ':', '!', '&' and '|' exist only as part of a two-char operator
    Token::try_from(first)
}

fn lex_constant(cursor: &mut Cursor) -> Result<Token, InnerLexError> {
    let start = cursor.as_str();
    let mut len = 0;

    while cursor.skip_if(|c| c.is_ascii_digit()) {
        len += 1;
    }

    if let Some(bad) = cursor.peek().filter(|c| c.is_ascii_alphabetic()) {
        return Err(InnerLexError::BadConstant(format!(
            "{}{bad}",
            &start[..len]
        )));
    }

    start[..len]
        .parse::<i32>()
        .map(Token::Constant)
        .map_err(|_| InnerLexError::BadConstant(start[..len].to_owned()))
}

fn lex_identifier(cursor: &mut Cursor) -> Token {
    let start = cursor.as_str();
    let mut len = 0;

    let predicate = |c: char| c.is_ascii_alphanumeric() || c == '_';
    while cursor.skip_if(predicate) {
        len += 1;
    }

    Token::from(&start[..len])
}

fn lex_string(cursor: &mut Cursor) -> Result<Token, InnerLexError> {
    cursor.take();
    let mut decoded = String::new();
    loop {
        match cursor.take() {
            None => return Err(InnerLexError::UnterminatedString),
            Some('"') => {
                // a doubled quote stands for a literal one
                if cursor.bump_if('"') {
                    decoded.push('"');
                } else {
                    return Ok(Token::StringLiteral(decoded));
                }
            }
            Some('\\') => match cursor.take() {
                Some('n') => decoded.push('\n'),
                Some('t') => decoded.push('\t'),
                Some('\\') => decoded.push('\\'),
                Some(c) => return Err(InnerLexError::BadEscape(c)),
                None => return Err(InnerLexError::UnterminatedString),
            },
            Some(c) => decoded.push(c),
        }
    }
}

fn skip_block_comment(cursor: &mut Cursor) -> Result<(), InnerLexError> {
    cursor.take();
    cursor.take();
    let mut depth = 1;
    while depth > 0 {
        match (cursor.peek(), cursor.peek_2nd()) {
            (Some('('), Some('*')) => {
                cursor.take();
                cursor.take();
                depth += 1;
            }
            (Some('*'), Some(')')) => {
                cursor.take();
                cursor.take();
                depth -= 1;
            }
            (Some(_), _) => {
                cursor.take();
            }
            (None, _) => return Err(InnerLexError::UnterminatedComment),
        }
    }
    Ok(())
}

fn skip_trivia(cursor: &mut Cursor) -> Result<(), InnerLexError> {
    loop {
        while cursor.skip_if(char::is_whitespace) {}
        match (cursor.peek(), cursor.peek_2nd()) {
            (Some('-'), Some('-')) => {
                while cursor.peek().filter(|c| *c != '\n').is_some() {
                    cursor.take();
                }
            }
            (Some('('), Some('*')) => skip_block_comment(cursor)?,
            _ => return Ok(()),
        }
    }
}

pub fn lex(input: &str) -> Result<Tokens, LexError> {
    let mut tokens = Tokens::new();
    let mut cursor = Cursor::new(input);

    loop {
        let trivia_pos = cursor.get_pos();
        skip_trivia(&mut cursor).map_err(|err| err.at(trivia_pos))?;
        let Some(peek) = cursor.peek() else {
            break;
        };
        let pos = cursor.get_pos();
        let token = match peek {
            ';' | ',' | '(' | ')' | '{' | '}' | '[' | ']' | '+' | '-' | '*' | '/' | '%' | '^' => {
                cursor.take();
                Token::try_from(peek)
            }
            ':' | '=' | '!' | '<' | '>' | '&' | '|' => lex_mcharoperator(&mut cursor),
            '_' | 'a'..='z' | 'A'..='Z' => Ok(lex_identifier(&mut cursor)),
            '0'..='9' => lex_constant(&mut cursor),
            '"' => lex_string(&mut cursor),
            _ => Err(InnerLexError::UnexpectedChar(peek)),
        }
        .map_err(|err| err.at(pos))?;
        tokens.push(PosToken::new(token, pos));
    }

    Ok(tokens)
}
