use super::*;
use crate::lexer;

fn parse_source(src: &str) -> Expr {
    let tokens = lexer::lex(src).unwrap();
    parse(&tokens).unwrap()
}

fn var(name: &str, line: u64, col: u64) -> Expr {
    Expr::Var(name.into(), Some(Pos { line, col }))
}

#[test]
fn test_expression_precedence() {
    let exp = String::from("1 * 2 - 3 * (4 + 5)");
    let tokens = lexer::lex(&exp).unwrap();
    let mut cursor = cursor::Cursor::new(&tokens);

    let parsed = parse_exp(&mut cursor, 0);
    let expected = Expr::binop(
        BinOp::Sub,
        Expr::binop(BinOp::Mul, Expr::Const(1), Expr::Const(2)),
        Expr::binop(
            BinOp::Mul,
            Expr::Const(3),
            Expr::binop(BinOp::Add, Expr::Const(4), Expr::Const(5)),
        ),
    );
    assert_eq!(Ok(expected), parsed);
}

#[test]
fn test_assignment_is_right_associative() {
    let exp = String::from("x := y := 1");
    let tokens = lexer::lex(&exp).unwrap();
    let mut cursor = cursor::Cursor::new(&tokens);

    let parsed = parse_exp(&mut cursor, 0);
    let expected = Expr::set(
        "x".into(),
        Some(Pos { line: 1, col: 1 }),
        Expr::set("y".into(), Some(Pos { line: 1, col: 6 }), Expr::Const(1)),
    );
    assert_eq!(Ok(expected), parsed);
}

#[test]
fn test_statement_values_are_dropped() {
    let parsed = parse_source("var x; x := 1");
    let expected = Expr::Scope(
        vec![Def::Var(vec!["x".into()])],
        Box::new(Expr::ignore(Expr::set(
            "x".into(),
            Some(Pos { line: 1, col: 8 }),
            Expr::Const(1),
        ))),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_element_assignment() {
    let parsed = parse_source("a[1] := 2");
    let expected = Expr::Scope(
        vec![],
        Box::new(Expr::ignore(Expr::assn(
            Expr::elem_ref(var("a", 1, 1), Expr::Const(1)),
            Expr::Const(2),
        ))),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_builtin_calls_are_desugared() {
    let parsed = parse_source("write(1)");
    let expected = Expr::Scope(
        vec![],
        Box::new(Expr::ignore(Expr::Builtin("write".into(), vec![Expr::Const(1)]))),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_for_desugars_to_while() {
    let parsed = parse_source("var i; for i := 0, i < 3, i := i + 1 do skip od");
    let init = Expr::ignore(Expr::set(
        "i".into(),
        Some(Pos { line: 1, col: 12 }),
        Expr::Const(0),
    ));
    let condition = Expr::binop(BinOp::Less, var("i", 1, 20), Expr::Const(3));
    let post = Expr::ignore(Expr::set(
        "i".into(),
        Some(Pos { line: 1, col: 27 }),
        Expr::binop(BinOp::Add, var("i", 1, 32), Expr::Const(1)),
    ));
    let expected = Expr::Scope(
        vec![Def::Var(vec!["i".into()])],
        Box::new(Expr::seq(
            init,
            Expr::while_(condition, Expr::seq(Expr::Skip, post)),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_fun_body_tail_is_its_value() {
    let parsed = parse_source("fun f(n) { n := n + 1; n * 2 } skip");
    let Expr::Scope(defs, body) = parsed else {
        panic!("expected top-level scope");
    };
    assert_eq!(Expr::Skip, *body);

    let [Def::Fun(name, params, fbody)] = defs.as_slice() else {
        panic!("expected a single function definition");
    };
    assert_eq!("f", name.as_str());
    assert_eq!(&vec!["n".to_owned()], params);
    let expected_body = Expr::Scope(
        vec![],
        Box::new(Expr::seq(
            Expr::ignore(Expr::set(
                "n".into(),
                Some(Pos { line: 1, col: 12 }),
                Expr::binop(BinOp::Add, var("n", 1, 17), Expr::Const(1)),
            )),
            Expr::binop(BinOp::Mul, var("n", 1, 24), Expr::Const(2)),
        )),
    );
    assert_eq!(&expected_body, fbody);
}

#[test]
fn test_if_branches_stay_balanced() {
    let parsed = parse_source("fun f(n) { if n then 1 else 2 fi } skip");
    let Expr::Scope(defs, _) = parsed else {
        panic!("expected top-level scope");
    };
    let [Def::Fun(_, _, fbody)] = defs.as_slice() else {
        panic!("expected a single function definition");
    };
    let expected = Expr::Scope(
        vec![],
        Box::new(Expr::if_(var("n", 1, 15), Expr::Const(1), Expr::Const(2))),
    );
    assert_eq!(&expected, fbody);
}

#[test]
fn test_wrong_lvalue() {
    let tokens = lexer::lex("1 := 2").unwrap();
    let parsed = parse(&tokens);
    let expected = Err(InnerParseError::WrongLvalue.at(Some(Pos { line: 1, col: 3 })));
    assert_eq!(expected, parsed);
}
