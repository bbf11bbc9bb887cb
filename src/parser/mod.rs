mod cursor;
mod parse_error;
#[cfg(test)]
mod parser_tests;

use crate::ast::*;
use crate::lexer::{PosToken, Token};
use cursor::Cursor;
pub use parse_error::{InnerParseError, ParseError, Result};

const BUILTINS: [&str; 3] = ["read", "write", "length"];

fn get_prec(token: &Token) -> u64 {
    match token {
        Token::Asterisk | Token::FSlash | Token::Percent => 50,
        Token::Plus | Token::Hyphen => 45,
        Token::IsLessThan
        | Token::IsLessThanOrEqual
        | Token::IsGreaterThan
        | Token::IsGreaterThanOrEqual => 35,
        Token::IsEqual | Token::IsNotEqual => 30,
        Token::Caret => 20,
        Token::LogicalAnd => 10,
        Token::LogicalOr => 5,
        Token::Assign => 1,
        _ => 0,
    }
}

impl TryFrom<&Token> for BinOp {
    type Error = InnerParseError;

    fn try_from(value: &Token) -> std::result::Result<Self, InnerParseError> {
        match value {
            Token::Plus => Ok(BinOp::Add),
            Token::Hyphen => Ok(BinOp::Sub),
            Token::Asterisk => Ok(BinOp::Mul),
            Token::FSlash => Ok(BinOp::Div),
            Token::Percent => Ok(BinOp::Rem),
            Token::IsEqual => Ok(BinOp::Eq),
            Token::IsNotEqual => Ok(BinOp::NotEq),
            Token::IsLessThan => Ok(BinOp::Less),
            Token::IsLessThanOrEqual => Ok(BinOp::LessEq),
            Token::IsGreaterThan => Ok(BinOp::Greater),
            Token::IsGreaterThanOrEqual => Ok(BinOp::GreaterEq),
            Token::LogicalAnd => Ok(BinOp::And),
            Token::LogicalOr => Ok(BinOp::Or),
            Token::Caret => Ok(BinOp::Xor),
            _ => Err(InnerParseError::UnexpectedToken(value.clone())),
        }
    }
}

fn parse_identifier(cursor: &mut Cursor) -> Result<Identifier> {
    let pos = cursor.get_pos();
    let next = cursor.next_or_error()?;
    if let Token::Identifier(name) = next {
        Ok(name.clone())
    } else {
        let next = next.clone();
        Err(InnerParseError::ExpectedIdentifierButGot(next).at(pos))
    }
}

fn parse_call_args(cursor: &mut Cursor) -> Result<Vec<Expr>> {
    cursor.expect(&Token::OpenParanth)?;
    let mut args = Vec::new();
    if cursor.bump_if(&Token::CloseParanth) {
        return Ok(args);
    }
    args.push(parse_exp(cursor, 0)?);
    while cursor.bump_if(&Token::Comma) {
        args.push(parse_exp(cursor, 0)?);
    }
    cursor.expect(&Token::CloseParanth)?;
    Ok(args)
}

fn parse_primary(cursor: &mut Cursor) -> Result<Expr> {
    let pos = cursor.get_pos();
    let next = cursor.peek_or_error()?.clone();
    match next {
        Token::Constant(n) => {
            cursor.bump();
            Ok(Expr::Const(n))
        }
        Token::StringLiteral(s) => {
            cursor.bump();
            Ok(Expr::Str(s))
        }
        Token::Hyphen => {
            cursor.bump();
            let e = parse_primary(cursor)?;
            Ok(Expr::binop(BinOp::Sub, Expr::Const(0), e))
        }
        Token::OpenParanth => {
            cursor.bump();
            let e = parse_exp(cursor, 0)?;
            cursor.expect(&Token::CloseParanth)?;
            Ok(e)
        }
        Token::OpenBracket => {
            cursor.bump();
            let mut elems = Vec::new();
            if !cursor.bump_if(&Token::CloseBracket) {
                elems.push(parse_exp(cursor, 0)?);
                while cursor.bump_if(&Token::Comma) {
                    elems.push(parse_exp(cursor, 0)?);
                }
                cursor.expect(&Token::CloseBracket)?;
            }
            Ok(Expr::Array(elems))
        }
        Token::Tag(tag) => {
            cursor.bump();
            let args = if cursor.peek() == Some(&Token::OpenParanth) {
                parse_call_args(cursor)?
            } else {
                Vec::new()
            };
            Ok(Expr::Sexp(tag, args))
        }
        Token::Identifier(name) => {
            cursor.bump();
            if cursor.peek() == Some(&Token::OpenParanth) {
                let args = parse_call_args(cursor)?;
                if BUILTINS.contains(&name.as_str()) {
                    Ok(Expr::Builtin(name, args))
                } else {
                    Ok(Expr::Call(name, pos, args))
                }
            } else {
                Ok(Expr::Var(name, pos))
            }
        }
        t => Err(InnerParseError::BadFactor(t).at(pos)),
    }
}

fn parse_factor(cursor: &mut Cursor) -> Result<Expr> {
    let mut e = parse_primary(cursor)?;
    while cursor.bump_if(&Token::OpenBracket) {
        let index = parse_exp(cursor, 0)?;
        cursor.expect(&Token::CloseBracket)?;
        e = Expr::elem(e, index);
    }
    Ok(e)
}

fn parse_exp_assign(cursor: &mut Cursor, prec: u64, left: Expr) -> Result<Expr> {
    let pos = cursor.get_pos();
    cursor.expect(&Token::Assign)?;
    let right = parse_exp(cursor, prec)?;
    match left {
        Expr::Var(name, name_pos) => Ok(Expr::set(name, name_pos, right)),
        Expr::Elem(c, i) => Ok(Expr::assn(Expr::ElemRef(c, i), right)),
        _ => Err(InnerParseError::WrongLvalue.at(pos)),
    }
}

fn parse_exp_binary(cursor: &mut Cursor, prec: u64, left: Expr) -> Result<Expr> {
    let pos = cursor.get_pos();
    let next = cursor.next_or_error()?;
    let op = BinOp::try_from(next).map_err(|err| err.at(pos))?;
    let right = parse_exp(cursor, prec + 1)?;
    Ok(Expr::binop(op, left, right))
}

fn parse_exp(cursor: &mut Cursor, min_prec: u64) -> Result<Expr> {
    let mut left = parse_factor(cursor)?;

    loop {
        let Some(next) = cursor.peek() else { break };
        let prec = get_prec(next);
        if prec == 0 || prec < min_prec {
            break;
        }
        let is_assign = *next == Token::Assign;
        left = if is_assign {
            parse_exp_assign(cursor, prec, left)?
        } else {
            parse_exp_binary(cursor, prec, left)?
        };
    }

    Ok(left)
}

fn wrap_ignore(e: Expr) -> Expr {
    if e.produces_value() {
        Expr::ignore(e)
    } else {
        e
    }
}

/// Rewrites a statement-mode tree so that its final item yields the value of
/// the enclosing function: the trailing `Ignore` is peeled off, and a
/// valueless tail gets a zero result appended.
fn into_value(e: Expr) -> Expr {
    match e {
        Expr::Ignore(inner) => *inner,
        Expr::Seq(a, b) => Expr::Seq(a, Box::new(into_value(*b))),
        Expr::If(c, t, f) => Expr::If(c, Box::new(into_value(*t)), Box::new(into_value(*f))),
        Expr::Scope(defs, b) => Expr::Scope(defs, Box::new(into_value(*b))),
        Expr::Skip => Expr::Const(0),
        e @ (Expr::While(..) | Expr::DoWhile(..)) => Expr::seq(e, Expr::Const(0)),
        e => e,
    }
}

// Parses everything between 'if'/'elif' and the closing 'fi', which is left
// for the outermost caller so that an elif chain shares a single 'fi'.
fn parse_if_tail(cursor: &mut Cursor) -> Result<Expr> {
    let condition = parse_exp(cursor, 0)?;
    cursor.expect(&Token::Then)?;
    let then = parse_seq(cursor)?;
    let pos = cursor.get_pos();
    let els = match cursor.peek_or_error()? {
        Token::Elif => {
            cursor.bump();
            parse_if_tail(cursor)?
        }
        Token::Else => {
            cursor.bump();
            parse_seq(cursor)?
        }
        Token::Fi => Expr::Skip,
        t => {
            let t = t.clone();
            return Err(InnerParseError::UnexpectedToken(t).at(pos));
        }
    };
    Ok(Expr::if_(condition, then, els))
}

fn parse_stmt(cursor: &mut Cursor) -> Result<Expr> {
    match cursor.peek_or_error()? {
        Token::Skip => {
            cursor.bump();
            Ok(Expr::Skip)
        }
        Token::If => {
            cursor.bump();
            let e = parse_if_tail(cursor)?;
            cursor.expect(&Token::Fi)?;
            Ok(e)
        }
        Token::While => {
            cursor.bump();
            let condition = parse_exp(cursor, 0)?;
            cursor.expect(&Token::Do)?;
            let body = parse_seq(cursor)?;
            cursor.expect(&Token::Od)?;
            Ok(Expr::while_(condition, body))
        }
        Token::Do => {
            cursor.bump();
            let body = parse_seq(cursor)?;
            cursor.expect(&Token::While)?;
            let condition = parse_exp(cursor, 0)?;
            cursor.expect(&Token::Od)?;
            Ok(Expr::do_while(body, condition))
        }
        Token::For => {
            cursor.bump();
            let init = parse_stmt(cursor)?;
            cursor.expect(&Token::Comma)?;
            let condition = parse_exp(cursor, 0)?;
            cursor.expect(&Token::Comma)?;
            let post = parse_stmt(cursor)?;
            cursor.expect(&Token::Do)?;
            let body = parse_seq(cursor)?;
            cursor.expect(&Token::Od)?;
            let looped = Expr::seq(body, wrap_ignore(post));
            Ok(Expr::seq(
                wrap_ignore(init),
                Expr::while_(condition, looped),
            ))
        }
        _ => parse_exp(cursor, 0),
    }
}

// Statements chained right-to-left so the continuation label threads into
// the last one.
fn fold_seq(items: Vec<Expr>) -> Expr {
    items
        .into_iter()
        .rev()
        .reduce(|acc, e| Expr::seq(e, acc))
        .unwrap_or(Expr::Skip)
}

fn parse_seq(cursor: &mut Cursor) -> Result<Expr> {
    let mut items = vec![wrap_ignore(parse_stmt(cursor)?)];
    while cursor.bump_if(&Token::Semicolon) {
        items.push(wrap_ignore(parse_stmt(cursor)?));
    }
    Ok(fold_seq(items))
}

fn parse_fun_params(cursor: &mut Cursor) -> Result<Vec<Identifier>> {
    cursor.expect(&Token::OpenParanth)?;
    let mut params = Vec::new();
    if cursor.bump_if(&Token::CloseParanth) {
        return Ok(params);
    }
    params.push(parse_identifier(cursor)?);
    while cursor.bump_if(&Token::Comma) {
        params.push(parse_identifier(cursor)?);
    }
    cursor.expect(&Token::CloseParanth)?;
    Ok(params)
}

fn parse_fun_body(cursor: &mut Cursor) -> Result<Expr> {
    cursor.expect(&Token::OpenCurly)?;
    let (defs, inits) = parse_defs(cursor)?;
    let stmts = if cursor.peek() == Some(&Token::CloseCurly) {
        None
    } else {
        Some(parse_seq(cursor)?)
    };
    cursor.expect(&Token::CloseCurly)?;
    let body = combine(inits, stmts);
    Ok(Expr::Scope(defs, Box::new(into_value(body))))
}

fn parse_defs(cursor: &mut Cursor) -> Result<(Vec<Def>, Vec<Expr>)> {
    let mut defs = Vec::new();
    let mut inits = Vec::new();
    loop {
        match cursor.peek() {
            Some(Token::Var) => {
                cursor.bump();
                let mut names = Vec::new();
                loop {
                    let pos = cursor.get_pos();
                    let name = parse_identifier(cursor)?;
                    if cursor.bump_if(&Token::Equal) {
                        let init = parse_exp(cursor, 0)?;
                        inits.push(Expr::ignore(Expr::set(name.clone(), pos, init)));
                    }
                    names.push(name);
                    if !cursor.bump_if(&Token::Comma) {
                        break;
                    }
                }
                cursor.expect(&Token::Semicolon)?;
                defs.push(Def::Var(names));
            }
            Some(Token::Fun) => {
                cursor.bump();
                let name = parse_identifier(cursor)?;
                let params = parse_fun_params(cursor)?;
                let body = parse_fun_body(cursor)?;
                defs.push(Def::Fun(name, params, body));
            }
            _ => return Ok((defs, inits)),
        }
    }
}

fn combine(inits: Vec<Expr>, stmts: Option<Expr>) -> Expr {
    let mut items = inits;
    if let Some(stmts) = stmts {
        items.push(stmts);
    }
    fold_seq(items)
}

pub fn parse(tokens: &[PosToken]) -> Result<Expr> {
    let mut cursor = Cursor::new(tokens);
    let (defs, inits) = parse_defs(&mut cursor)?;
    let stmts = if cursor.at_end() {
        None
    } else {
        Some(parse_seq(&mut cursor)?)
    };
    if let Some(t) = cursor.peek() {
        let t = t.clone();
        return Err(InnerParseError::UnexpectedToken(t).at(cursor.get_pos()));
    }
    let body = combine(inits, stmts);
    Ok(Expr::Scope(defs, Box::new(body)))
}
