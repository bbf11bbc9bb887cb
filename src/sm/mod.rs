mod compile_error;
mod env;
mod insn;
mod interp;
#[cfg(test)]
mod interp_tests;
#[cfg(test)]
mod sm_tests;
mod verify;

use crate::ast::{Def, Expr, Identifier, Pos};
pub use compile_error::{CompileError, Result};
pub use env::{Env, SymState};
pub use insn::{JumpCond, Loc, SmInsn, SmProg};
pub use interp::{run, Value};
pub use verify::verify;

/// Translates a whole program to SM code. The program is wrapped into a
/// `main` function over the empty symbol state, and hoisted function bodies
/// are drained until none are pending; each body is compiled exactly once.
pub fn compile(program: Expr) -> Result<SmProg> {
    let mut env = Env::new();
    env.remember_fun("main".to_owned(), Vec::new(), program);

    let mut code = SmProg::new();
    while let Some(fun) = env.pop_pending() {
        compile_fun(&mut env, &mut code, fun)?;
    }
    Ok(code)
}

fn compile_fun(env: &mut Env, code: &mut SmProg, fun: env::PendingFun) -> Result<()> {
    let env::PendingFun {
        label,
        args,
        body,
        state,
    } = fun;
    env.enter_function(state, &args);
    let lab = env.fresh_label();

    let mut body_code = SmProg::new();
    let lab_used = compile_expr(&lab, env, &mut body_code, &body)?;

    code.push(SmInsn::Label(label.clone()));
    code.push(SmInsn::Begin(label, env.n_args(), env.n_locals()));
    code.append(&mut body_code);
    if lab_used {
        code.push(SmInsn::Label(lab));
    }
    code.push(SmInsn::End);
    Ok(())
}

/// Compiles a subtree in a non-tail position: the continuation label is
/// fresh, and emitted only when some inner jump landed on it.
fn compile_step(env: &mut Env, code: &mut SmProg, e: &Expr) -> Result<()> {
    let lab = env.fresh_label();
    if compile_expr(&lab, env, code, e)? {
        code.push(SmInsn::Label(lab));
    }
    Ok(())
}

/// Right-to-left argument chain: the last argument is evaluated first and
/// the leftmost one ends up on top of the operand stack.
fn args_chain(args: &[Expr]) -> Expr {
    args.iter()
        .rev()
        .fold(Expr::Skip, |acc, e| Expr::seq(acc, e.clone()))
}

fn compile_call(
    name: &Identifier,
    pos: Option<Pos>,
    args: &[Expr],
    env: &mut Env,
    code: &mut SmProg,
) -> Result<()> {
    let (label, _arity) = env.lookup_fun(name, pos)?;
    compile_step(env, code, &args_chain(args))?;
    match label.strip_prefix('$') {
        Some(runtime_name) => code.push(SmInsn::Builtin(runtime_name.to_owned(), args.len())),
        None => code.push(SmInsn::Call(label, args.len())),
    }
    Ok(())
}

fn compile_scope(
    lab: &str,
    defs: &[Def],
    body: &Expr,
    env: &mut Env,
    code: &mut SmProg,
) -> Result<bool> {
    env.syms.enter_scope();

    // First pass: bind every name of the scope, so sibling functions can
    // refer to each other and to all of the scope's variables.
    let mut funs = Vec::new();
    for def in defs {
        match def {
            Def::Var(names) => {
                for name in names {
                    if env.add_var(name, true) {
                        code.push(SmInsn::Global(name.clone()));
                    }
                }
            }
            Def::Val(names) => {
                for name in names {
                    if env.add_var(name, false) {
                        code.push(SmInsn::Global(name.clone()));
                    }
                }
            }
            Def::Fun(name, args, fbody) => {
                let label = env.fun_label(name);
                env.syms.add(name, Loc::Fun(label.clone(), args.len()));
                funs.push((label, args, fbody));
            }
        }
    }

    // Second pass: capture the now-complete symbol state for each function.
    for (label, args, fbody) in funs {
        env.remember_fun(label, args.clone(), fbody.clone());
    }

    let lab_used = compile_expr(lab, env, code, body)?;
    env.syms.leave_scope();
    Ok(lab_used)
}

/// Compiles one AST node, appending SM code to `code`. Returns whether
/// `lab`, the label execution falls through to after this subtree, was used
/// as a jump target and must be emitted by the caller.
fn compile_expr(lab: &str, env: &mut Env, code: &mut SmProg, e: &Expr) -> Result<bool> {
    match e {
        Expr::Skip => Ok(false),
        Expr::Const(n) => {
            code.push(SmInsn::Const(*n));
            Ok(false)
        }
        Expr::Str(s) => {
            code.push(SmInsn::Str(s.clone()));
            Ok(false)
        }
        Expr::Var(name, pos) => {
            let loc = env.lookup_val(name, *pos)?;
            code.push(SmInsn::Ld(loc));
            Ok(false)
        }
        Expr::Ref(name, pos) => {
            let loc = env.lookup_var(name, *pos)?;
            code.push(SmInsn::Lda(loc));
            Ok(false)
        }
        Expr::Set(name, pos, rhs) => {
            compile_step(env, code, rhs)?;
            let loc = env.lookup_var(name, *pos)?;
            code.push(SmInsn::St(loc));
            Ok(false)
        }
        Expr::Assn(lhs, rhs) => {
            compile_step(env, code, lhs)?;
            compile_step(env, code, rhs)?;
            if matches!(lhs.as_ref(), Expr::ElemRef(..)) {
                code.push(SmInsn::Sta);
            } else {
                code.push(SmInsn::Sti);
            }
            Ok(false)
        }
        Expr::Binop(op, a, b) => {
            compile_step(env, code, a)?;
            compile_step(env, code, b)?;
            code.push(SmInsn::Binop(*op));
            Ok(false)
        }
        Expr::Seq(a, b) => {
            compile_step(env, code, a)?;
            compile_expr(lab, env, code, b)
        }
        Expr::If(c, t, f) => {
            let l_else = env.fresh_label();
            compile_step(env, code, c)?;
            code.push(SmInsn::CJmp(JumpCond::Z, l_else.clone()));
            compile_step(env, code, t)?;
            code.push(SmInsn::Jmp(lab.to_owned()));
            code.push(SmInsn::Label(l_else));
            compile_expr(lab, env, code, f)?;
            Ok(true)
        }
        Expr::While(c, b) => {
            let l_cond = env.fresh_label();
            let l_body = env.fresh_label();
            code.push(SmInsn::Jmp(l_cond.clone()));
            code.push(SmInsn::Label(l_body.clone()));
            // the body label is emitted unconditionally, so the flag is moot
            compile_expr(&l_cond, env, code, b)?;
            code.push(SmInsn::Label(l_cond));
            compile_step(env, code, c)?;
            code.push(SmInsn::CJmp(JumpCond::Nz, l_body));
            Ok(false)
        }
        Expr::DoWhile(b, c) => {
            let l_body = env.fresh_label();
            code.push(SmInsn::Label(l_body.clone()));
            compile_step(env, code, b)?;
            compile_step(env, code, c)?;
            code.push(SmInsn::CJmp(JumpCond::Nz, l_body));
            Ok(false)
        }
        Expr::Ignore(inner) => {
            compile_step(env, code, inner)?;
            code.push(SmInsn::Drop);
            Ok(false)
        }
        Expr::Call(name, pos, args) => {
            compile_call(name, *pos, args, env, code)?;
            Ok(false)
        }
        Expr::Builtin(name, args) => {
            compile_call(name, None, args, env, code)?;
            Ok(false)
        }
        Expr::Scope(defs, body) => compile_scope(lab, defs, body, env, code),
        Expr::Array(elems) => {
            compile_step(env, code, &args_chain(elems))?;
            code.push(SmInsn::Array(elems.len()));
            Ok(false)
        }
        Expr::Sexp(tag, elems) => {
            compile_step(env, code, &args_chain(elems))?;
            code.push(SmInsn::Sexp(tag.clone(), elems.len()));
            Ok(false)
        }
        Expr::Elem(c, i) => {
            let pair = Expr::Seq(c.clone(), i.clone());
            compile_step(env, code, &pair)?;
            code.push(SmInsn::Elem);
            Ok(false)
        }
        Expr::ElemRef(c, i) => {
            // the container/index pair itself is the reference
            let pair = Expr::Seq(c.clone(), i.clone());
            compile_step(env, code, &pair)?;
            Ok(false)
        }
    }
}
