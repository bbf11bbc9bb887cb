use super::*;
use crate::ast::BinOp;
use crate::lexer;
use crate::parser;

fn compile_source(src: &str) -> Result<SmProg> {
    let tokens = lexer::lex(src).unwrap();
    let ast = parser::parse(&tokens).unwrap();
    compile(ast)
}

fn glb(name: &str) -> Loc {
    Loc::Global(name.to_owned(), true)
}

#[test]
fn test_straight_line_expression() {
    let prog = compile_source("write(1+2*3)").unwrap();
    let expected = vec![
        SmInsn::Label("main".into()),
        SmInsn::Begin("main".into(), 0, 0),
        SmInsn::Const(1),
        SmInsn::Const(2),
        SmInsn::Const(3),
        SmInsn::Binop(BinOp::Mul),
        SmInsn::Binop(BinOp::Add),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::End,
    ];
    assert_eq!(expected, prog);
}

#[test]
fn test_if_reuses_the_sequence_label() {
    let src = "var x; x := read(); if x then write(1) else write(2) fi; write(3)";
    let prog = compile_source(src).unwrap();
    let expected = vec![
        SmInsn::Label("main".into()),
        SmInsn::Begin("main".into(), 0, 0),
        SmInsn::Global("x".into()),
        SmInsn::Builtin("read".into(), 0),
        SmInsn::St(glb("x")),
        SmInsn::Drop,
        SmInsn::Ld(glb("x")),
        SmInsn::CJmp(JumpCond::Z, "L6".into()),
        SmInsn::Const(1),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::Jmp("L5".into()),
        SmInsn::Label("L6".into()),
        SmInsn::Const(2),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::Label("L5".into()),
        SmInsn::Const(3),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::End,
    ];
    assert_eq!(expected, prog);
}

#[test]
fn test_while_loop_shape() {
    let src = "var n; n := read(); while n do n := n - 1 od; write(n)";
    let prog = compile_source(src).unwrap();
    let expected = vec![
        SmInsn::Label("main".into()),
        SmInsn::Begin("main".into(), 0, 0),
        SmInsn::Global("n".into()),
        SmInsn::Builtin("read".into(), 0),
        SmInsn::St(glb("n")),
        SmInsn::Drop,
        SmInsn::Jmp("L6".into()),
        SmInsn::Label("L7".into()),
        SmInsn::Ld(glb("n")),
        SmInsn::Const(1),
        SmInsn::Binop(BinOp::Sub),
        SmInsn::St(glb("n")),
        SmInsn::Drop,
        SmInsn::Label("L6".into()),
        SmInsn::Ld(glb("n")),
        SmInsn::CJmp(JumpCond::Nz, "L7".into()),
        SmInsn::Ld(glb("n")),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::End,
    ];
    assert_eq!(expected, prog);
}

#[test]
fn test_function_hoisting_and_recursion() {
    let src = "fun f(n) { if n < 2 then n else f(n-1) + f(n-2) fi } write(f(10))";
    let prog = compile_source(src).unwrap();
    let expected = vec![
        SmInsn::Label("main".into()),
        SmInsn::Begin("main".into(), 0, 0),
        SmInsn::Const(10),
        SmInsn::Call("Lf".into(), 1),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::End,
        SmInsn::Label("Lf".into()),
        SmInsn::Begin("Lf".into(), 1, 0),
        SmInsn::Ld(Loc::Arg(0)),
        SmInsn::Const(2),
        SmInsn::Binop(BinOp::Less),
        SmInsn::CJmp(JumpCond::Z, "L7".into()),
        SmInsn::Ld(Loc::Arg(0)),
        SmInsn::Jmp("L6".into()),
        SmInsn::Label("L7".into()),
        SmInsn::Ld(Loc::Arg(0)),
        SmInsn::Const(1),
        SmInsn::Binop(BinOp::Sub),
        SmInsn::Call("Lf".into(), 1),
        SmInsn::Ld(Loc::Arg(0)),
        SmInsn::Const(2),
        SmInsn::Binop(BinOp::Sub),
        SmInsn::Call("Lf".into(), 1),
        SmInsn::Binop(BinOp::Add),
        SmInsn::Label("L6".into()),
        SmInsn::End,
    ];
    assert_eq!(expected, prog);
    verify(&prog).unwrap();
}

#[test]
fn test_locals_are_numbered_per_function() {
    let src = "fun f(a) { var u, v; u := a; v := u; v } write(f(1))";
    let prog = compile_source(src).unwrap();
    // u and v land in slots 0 and 1 of f's frame, not in .data
    assert!(prog.contains(&SmInsn::Begin("Lf".into(), 1, 2)));
    assert!(prog.contains(&SmInsn::St(Loc::Local(0, true))));
    assert!(prog.contains(&SmInsn::St(Loc::Local(1, true))));
    assert!(!prog.contains(&SmInsn::Global("u".into())));
}

#[test]
fn test_nested_function_gets_numbered_label() {
    let src = "fun f(n) { fun g(k) { k * 2 } g(n) + 1 } write(f(5))";
    let prog = compile_source(src).unwrap();
    let nested_label = prog.iter().find_map(|insn| match insn {
        SmInsn::Begin(name, 1, _) if name.starts_with("Lg_") => Some(name.clone()),
        _ => None,
    });
    let nested_label = nested_label.expect("nested function label");
    assert!(prog.contains(&SmInsn::Call(nested_label, 1)));
    verify(&prog).unwrap();
}

#[test]
fn test_reference_assignment_uses_sti() {
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
    let expected = vec![
        SmInsn::Label("main".into()),
        SmInsn::Begin("main".into(), 0, 0),
        SmInsn::Global("x".into()),
        SmInsn::Lda(glb("x")),
        SmInsn::Const(5),
        SmInsn::Sti,
        SmInsn::Drop,
        SmInsn::Ld(glb("x")),
        SmInsn::Builtin("write".into(), 1),
        SmInsn::Drop,
        SmInsn::End,
    ];
    assert_eq!(expected, prog);
}

#[test]
fn test_element_assignment_uses_sta() {
    let prog = compile_source("var a; a := [1, 2]; a[0] := 9").unwrap();
    assert!(prog.contains(&SmInsn::Array(2)));
    assert!(prog.contains(&SmInsn::Sta));
    // array elements are evaluated right to left
    let c2 = prog.iter().position(|i| *i == SmInsn::Const(2)).unwrap();
    let c1 = prog.iter().position(|i| *i == SmInsn::Const(1)).unwrap();
    assert!(c2 < c1);
}

#[test]
fn test_ref_to_val_is_rejected() {
    let ast = Expr::Scope(
        vec![Def::Val(vec!["c".into()])],
        Box::new(Expr::ignore(Expr::assn(
            Expr::Ref("c".into(), None),
            Expr::Const(1),
        ))),
    );
    let err = compile(ast).unwrap_err();
    assert_eq!(CompileError::NotAVariable("c".into(), None), err);
    assert_eq!(
        "the name \"c\" does not designate a variable",
        err.to_string()
    );
}

#[test]
fn test_unknown_name_reports_position() {
    let err = compile_source("write(y)").unwrap_err();
    assert_eq!(
        "the name \"y\" does not designate a value at 1:7",
        err.to_string()
    );
}

#[test]
fn test_call_on_variable_is_rejected() {
    let err = compile_source("var f; f(1)").unwrap_err();
    assert_eq!(
        "the name \"f\" does not designate a function at 1:8",
        err.to_string()
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let src = "var x; x := read(); if x then write(1) else write(2) fi; write(3)";
    let first = compile_source(src).unwrap();
    let second = compile_source(src).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_compiled_programs_are_well_formed() {
    let sources = [
        "write(1+2*3)",
        "var x; x := read(); write(x*x)",
        "var i, s; s := 0; for i := 1, i <= 5, i := i+1 do s := s + i od; write(s)",
        "fun f(n) { if n < 2 then n else f(n-1) + f(n-2) fi } write(f(10))",
        "var a; a := [10,20,30]; a[1] := a[1]+a[2]; write(a[1])",
        "write(length(\"hello\"))",
    ];
    for src in sources {
        let prog = compile_source(src).unwrap();
        verify(&prog).unwrap_or_else(|err| panic!("{src}: {err}"));
    }
}

// Every emitted label is either a function head or the target of some jump.
#[test]
fn test_no_dead_labels() {
    let src = "var i, s; s := 0; for i := 1, i <= 5, i := i+1 do s := s + i od; \
               if s then write(s) else skip fi; write(0)";
    let prog = compile_source(src).unwrap();
    for insn in &prog {
        let SmInsn::Label(l) = insn else { continue };
        let referenced = prog.iter().any(|other| match other {
            SmInsn::Jmp(t) | SmInsn::CJmp(_, t) | SmInsn::Call(t, _) => t == l,
            SmInsn::Begin(name, _, _) => name == l,
            _ => false,
        });
        assert!(referenced, "dead label {l} in:\n{prog:#?}");
    }
}
