use super::*;
use crate::lexer;
use crate::parser;

fn run_source(src: &str, input: &str) -> String {
    let tokens = lexer::lex(src).unwrap();
    let ast = parser::parse(&tokens).unwrap();
    let prog = compile(ast).unwrap();
    verify(&prog).unwrap();
    let mut output = Vec::new();
    run(&prog, &mut input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_arithmetic() {
    assert_eq!("7\n", run_source("write(1+2*3)", ""));
}

#[test]
fn test_read_write() {
    assert_eq!("36\n", run_source("var x; x := read(); write(x*x)", "6\n"));
}

#[test]
fn test_for_loop() {
    let src = "var i, s; s := 0; for i := 1, i <= 5, i := i+1 do s := s + i od; write(s)";
    assert_eq!("15\n", run_source(src, ""));
}

#[test]
fn test_recursion() {
    let src = "fun f(n) { if n < 2 then n else f(n-1) + f(n-2) fi } write(f(10))";
    assert_eq!("55\n", run_source(src, ""));
}

#[test]
fn test_array_element_assignment() {
    let src = "var a; a := [10,20,30]; a[1] := a[1]+a[2]; write(a[1])";
    assert_eq!("50\n", run_source(src, ""));
}

#[test]
fn test_string_length() {
    assert_eq!("5\n", run_source("write(length(\"hello\"))", ""));
}

#[test]
fn test_do_while() {
    let src = "var i; i := 0; do i := i + 1 while i < 3 od; write(i)";
    assert_eq!("3\n", run_source(src, ""));
}

#[test]
fn test_elif_chain() {
    let src = "var x; x := read(); \
               if x == 1 then write(10) elif x == 2 then write(20) else write(30) fi";
    assert_eq!("20\n", run_source(src, "2\n"));
}

// Arguments evaluate right to left; the leftmost actual binds to the
// leftmost formal.
#[test]
fn test_call_arguments_evaluate_right_to_left() {
    let src = "var a; \
               fun tr(x) { a := a*10 + x; x } \
               fun g(x, y, z) { x } \
               a := 0; \
               write(g(tr(1), tr(2), tr(3))); \
               write(a)";
    assert_eq!("1\n321\n", run_source(src, ""));
}

#[test]
fn test_builtin_arguments_share_the_order() {
    let src = "var a; \
               fun tr(x) { a := a*10 + x; x } \
               a := 0; \
               write(length([tr(1), tr(2), tr(3)])); \
               write(a)";
    assert_eq!("3\n321\n", run_source(src, ""));
}

#[test]
fn test_sexp_construction_and_access() {
    let src = "var p; p := Pair (1, 2); write(p[0]); write(p[1]); write(length(p))";
    assert_eq!("1\n2\n2\n", run_source(src, ""));
}

#[test]
fn test_string_is_mutable_through_elements() {
    let src = "var s; s := \"abc\"; s[0] := 66; write(s[0]); write(s[1])";
    assert_eq!("66\n98\n", run_source(src, ""));
}

#[test]
fn test_arrays_alias() {
    let src = "var a, b; a := [1, 2]; b := a; b[0] := 7; write(a[0])";
    assert_eq!("7\n", run_source(src, ""));
}

#[test]
fn test_nested_function_uses_globals() {
    let src = "var base; base := 100; \
               fun f(n) { fun g(k) { k * 2 + base } g(n) + 1 } \
               write(f(5))";
    assert_eq!("111\n", run_source(src, ""));
}

#[test]
fn test_function_arguments_are_assignable() {
    let src = "fun f(n) { n := n + 1; n } write(f(41))";
    assert_eq!("42\n", run_source(src, ""));
}

#[test]
fn test_reference_assignment() {
    let ast = Expr::Scope(
        vec![Def::Var(vec!["x".into()])],
        Box::new(Expr::seq(
            Expr::ignore(Expr::assn(Expr::Ref("x".into(), None), Expr::Const(5))),
            Expr::ignore(Expr::Builtin(
                "write".into(),
                vec![Expr::Var("x".into(), None)],
            )),
        )),
    );
    let prog = compile(ast).unwrap();
    let mut output = Vec::new();
    run(&prog, &mut "".as_bytes(), &mut output).unwrap();
    assert_eq!("5\n", String::from_utf8(output).unwrap());
}

#[test]
fn test_logical_operators_normalize() {
    let src = "write(2 && 3); write(0 || 5); write(0 && 7); write(4 ^ 1)";
    assert_eq!("1\n1\n0\n5\n", run_source(src, ""));
}

#[test]
fn test_assignment_chains() {
    let src = "var x, y; x := y := 21; write(x + y)";
    assert_eq!("42\n", run_source(src, ""));
}

#[test]
fn test_multiple_reads() {
    let src = "var a, b; a := read(); b := read(); write(a - b)";
    assert_eq!("4\n", run_source(src, "10\n6\n"));
}
