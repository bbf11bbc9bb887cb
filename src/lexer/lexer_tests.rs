use super::*;
use crate::ast::Pos;

fn bare(tokens: Tokens) -> Vec<Token> {
    tokens.into_iter().map(|t| t.token).collect()
}

#[test]
fn test_basic() {
    let input = String::from("var x; x := read(); write(x*x)");
    let lexed = lex(&input).map(bare);
    let expected = vec![
        Token::Var,
        Token::Identifier(String::from("x")),
        Token::Semicolon,
        Token::Identifier(String::from("x")),
        Token::Assign,
        Token::Identifier(String::from("read")),
        Token::OpenParanth,
        Token::CloseParanth,
        Token::Semicolon,
        Token::Identifier(String::from("write")),
        Token::OpenParanth,
        Token::Identifier(String::from("x")),
        Token::Asterisk,
        Token::Identifier(String::from("x")),
        Token::CloseParanth,
    ];
    assert_eq!(Ok(expected), lexed);
}

#[test]
fn test_operators_and_tags() {
    let input = String::from("a <= b != Cons (1, 2) && c == d");
    let lexed = lex(&input).map(bare);
    let expected = vec![
        Token::Identifier(String::from("a")),
        Token::IsLessThanOrEqual,
        Token::Identifier(String::from("b")),
        Token::IsNotEqual,
        Token::Tag(String::from("Cons")),
        Token::OpenParanth,
        Token::Constant(1),
        Token::Comma,
        Token::Constant(2),
        Token::CloseParanth,
        Token::LogicalAnd,
        Token::Identifier(String::from("c")),
        Token::IsEqual,
        Token::Identifier(String::from("d")),
    ];
    assert_eq!(Ok(expected), lexed);
}

#[test]
fn test_comments() {
    let input = String::from("1 -- line comment\n(* block (* nested *) *) 2");
    let lexed = lex(&input).map(bare);
    assert_eq!(Ok(vec![Token::Constant(1), Token::Constant(2)]), lexed);
}

#[test]
fn test_string_escapes() {
    let input = String::from(r#""he said ""hi""\n""#);
    let lexed = lex(&input).map(bare);
    let expected = vec![Token::StringLiteral(String::from("he said \"hi\"\n"))];
    assert_eq!(Ok(expected), lexed);
}

#[test]
fn test_positions() {
    let input = String::from("x :=\n  y");
    let lexed = lex(&input).unwrap();
    let positions: Vec<Pos> = lexed.into_iter().map(|t| t.pos).collect();
    let expected = vec![
        Pos { line: 1, col: 1 },
        Pos { line: 1, col: 3 },
        Pos { line: 2, col: 3 },
    ];
    assert_eq!(expected, positions);
}

#[test]
fn test_bad_char() {
    let input = String::from("x @ y");
    let lexed = lex(&input);
    let expected = Err(InnerLexError::UnexpectedChar('@').at(Pos { line: 1, col: 3 }));
    assert_eq!(expected, lexed);
}

#[test]
fn test_bad_constant() {
    let input = String::from("1foo");
    let lexed = lex(&input);
    let expected = Err(InnerLexError::BadConstant(String::from("1f")).at(Pos { line: 1, col: 1 }));
    assert_eq!(expected, lexed);
}
