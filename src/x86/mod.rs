mod asm;
mod env;

use crate::sm::{Loc, SmInsn};
pub use asm::*;
pub use env::CodegenEnv;

/// Character set the runtime hashes s-expression tags over, 6 bits per
/// character; the generated code must agree with it for pattern dispatch.
const TAG_CHARS: &str = "_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Stable hash of an s-expression tag: the first five characters packed
/// 6 bits each, most significant first.
pub fn tag_hash(tag: &str) -> i32 {
    let mut h: i32 = 0;
    for c in tag.chars().take(5) {
        let pos = TAG_CHARS
            .find(c)
            .unwrap_or_else(|| panic!("character {c:?} cannot appear in a tag"));
        h = (h << 6) | pos as i32;
    }
    h
}

/// Escapes a string literal for a `.string` directive: quotes are doubled,
/// newlines and tabs become their backslash forms, everything else is kept.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\"\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn loc(x: &Loc) -> Opnd {
    match x {
        Loc::Arg(i) => Opnd::S(-(*i as i32) - 1),
        Loc::Local(i, _) => Opnd::S(*i as i32),
        Loc::Global(name, _) => Opnd::M(format!("global_{name}")),
        Loc::Fun(label, _) => Opnd::M(label.clone()),
    }
}

/// x86 forbids memory-to-memory moves; those are routed through `%eax`.
fn move_insn(code: &mut AsmInsns, src: &Opnd, dst: &Opnd) {
    if src.is_mem() && dst.is_mem() {
        code.push(AsmInsn::Mov(src.clone(), EAX));
        code.push(AsmInsn::Mov(EAX, dst.clone()));
    } else {
        code.push(AsmInsn::Mov(src.clone(), dst.clone()));
    }
}

fn lea_insn(code: &mut AsmInsns, src: Opnd, dst: &Opnd) {
    if dst.is_mem() {
        code.push(AsmInsn::Lea(src, EAX));
        code.push(AsmInsn::Mov(EAX, dst.clone()));
    } else {
        code.push(AsmInsn::Lea(src, dst.clone()));
    }
}

fn compile_binop(code: &mut AsmInsns, op: crate::ast::BinOp, dst: &Opnd, src: &Opnd) {
    use crate::ast::BinOp;
    if op.is_logical() {
        // both operands normalized to 0/1 before the bitwise op
        code.push(AsmInsn::Binop(AsmBinop::Xor, EAX, EAX));
        code.push(AsmInsn::Cmp(Opnd::L(0), dst.clone()));
        code.push(AsmInsn::SetCC(Condition::Ne, EAX));
        code.push(AsmInsn::Binop(AsmBinop::Xor, EDX, EDX));
        code.push(AsmInsn::Cmp(Opnd::L(0), src.clone()));
        code.push(AsmInsn::SetCC(Condition::Ne, EDX));
        code.push(AsmInsn::Binop(AsmBinop::from(op), EDX, EAX));
        code.push(AsmInsn::Mov(EAX, dst.clone()));
        return;
    }
    if op.is_comparison() {
        code.push(AsmInsn::Binop(AsmBinop::Xor, EAX, EAX));
        if src.is_mem() {
            code.push(AsmInsn::Mov(dst.clone(), EDX));
            code.push(AsmInsn::Cmp(src.clone(), EDX));
        } else {
            code.push(AsmInsn::Cmp(src.clone(), dst.clone()));
        }
        code.push(AsmInsn::SetCC(Condition::from(op), EAX));
        code.push(AsmInsn::Mov(EAX, dst.clone()));
        return;
    }
    match op {
        BinOp::Div => {
            code.push(AsmInsn::Mov(dst.clone(), EAX));
            code.push(AsmInsn::Cltd);
            code.push(AsmInsn::IDiv(src.clone()));
            code.push(AsmInsn::Mov(EAX, dst.clone()));
        }
        BinOp::Rem => {
            code.push(AsmInsn::Mov(dst.clone(), EAX));
            code.push(AsmInsn::Cltd);
            code.push(AsmInsn::IDiv(src.clone()));
            code.push(AsmInsn::Mov(EDX, dst.clone()));
        }
        _ => {
            let aop = AsmBinop::from(op);
            if dst.is_mem() {
                code.push(AsmInsn::Mov(dst.clone(), EAX));
                code.push(AsmInsn::Binop(aop, src.clone(), EAX));
                code.push(AsmInsn::Mov(EAX, dst.clone()));
            } else {
                code.push(AsmInsn::Binop(aop, src.clone(), dst.clone()));
            }
        }
    }
}

/// Push order for the argument operands of a runtime or user call.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Marshal {
    /// push in reverse pop order: the top of the operand stack becomes the
    /// first (lowest-address) cdecl argument
    Reversed,
    /// push in pop order: the deepest consumed operand becomes the first
    /// cdecl argument (`Belem` takes its container first, and the container
    /// is evaluated before the index)
    Straight,
}

fn compile_call(env: &mut CodegenEnv, code: &mut AsmInsns, f: &str, n: usize, order: Marshal) {
    let live = env.live_registers(n);
    for r in &live {
        code.push(AsmInsn::Push(r.clone()));
    }

    let args: Vec<Opnd> = (0..n).map(|_| env.pop()).collect();
    match order {
        Marshal::Reversed => {
            for a in args.iter().rev() {
                code.push(AsmInsn::Push(a.clone()));
            }
        }
        Marshal::Straight => {
            for a in &args {
                code.push(AsmInsn::Push(a.clone()));
            }
        }
    }

    code.push(AsmInsn::Call(f.to_owned()));
    if n > 0 {
        code.push(AsmInsn::Binop(AsmBinop::Add, Opnd::L(4 * n as i32), ESP));
    }
    for r in live.iter().rev() {
        code.push(AsmInsn::Pop(r.clone()));
    }

    let dst = env.allocate();
    code.push(AsmInsn::Mov(EAX, dst));
}

/// `Barray`/`Bsexp` take a boxed-value count pushed last; an s-expression
/// additionally carries its tag hash pushed first, above all elements.
fn compile_alloc_call(
    env: &mut CodegenEnv,
    code: &mut AsmInsns,
    f: &str,
    n: usize,
    tag: Option<&str>,
) {
    let live = env.live_registers(n);
    for r in &live {
        code.push(AsmInsn::Push(r.clone()));
    }

    let mut pushed = n;
    if let Some(tag) = tag {
        code.push(AsmInsn::Push(Opnd::L(tag_hash(tag))));
        pushed += 1;
    }
    let args: Vec<Opnd> = (0..n).map(|_| env.pop()).collect();
    for a in args.iter().rev() {
        code.push(AsmInsn::Push(a.clone()));
    }
    code.push(AsmInsn::Push(Opnd::L(pushed as i32)));
    pushed += 1;

    code.push(AsmInsn::Call(f.to_owned()));
    code.push(AsmInsn::Binop(
        AsmBinop::Add,
        Opnd::L(4 * pushed as i32),
        ESP,
    ));
    for r in live.iter().rev() {
        code.push(AsmInsn::Pop(r.clone()));
    }

    let dst = env.allocate();
    code.push(AsmInsn::Mov(EAX, dst));
}

fn lower(insn: &SmInsn, env: &mut CodegenEnv, code: &mut AsmInsns) {
    match insn {
        SmInsn::Const(n) => {
            let dst = env.allocate();
            code.push(AsmInsn::Mov(Opnd::L(*n), dst));
        }
        SmInsn::Str(s) => {
            let name = env.string(escape(s));
            let dst = env.allocate();
            lea_insn(code, Opnd::M(name), &dst);
            compile_call(env, code, "Bstring", 1, Marshal::Reversed);
        }
        SmInsn::Global(name) => env.global(name),
        SmInsn::Ld(x) => {
            let src = loc(x);
            let dst = env.allocate();
            move_insn(code, &src, &dst);
        }
        SmInsn::Lda(x) => {
            let src = loc(x);
            let dst = env.allocate();
            lea_insn(code, src, &dst);
        }
        SmInsn::St(x) => {
            let top = env.peek().clone();
            move_insn(code, &top, &loc(x));
        }
        SmInsn::Sti => {
            let v = env.pop();
            let addr = env.pop();
            let result = env.allocate();
            let v = if v.is_mem() {
                code.push(AsmInsn::Mov(v, EAX));
                EAX
            } else {
                v
            };
            match &addr {
                Opnd::R(_) => {
                    code.push(AsmInsn::Mov(v.clone(), Opnd::I(0, Box::new(addr.clone()))));
                }
                _ => {
                    code.push(AsmInsn::Mov(addr.clone(), EDX));
                    code.push(AsmInsn::Mov(v.clone(), Opnd::I(0, Box::new(EDX))));
                }
            }
            code.push(AsmInsn::Mov(v, result));
        }
        SmInsn::Binop(op) => {
            let src = env.pop();
            let dst = env.peek().clone();
            compile_binop(code, *op, &dst, &src);
        }
        SmInsn::Label(l) => {
            if env.drop_barrier() {
                env.retrieve_stack(l);
            }
            code.push(AsmInsn::Label(l.clone()));
        }
        SmInsn::Jmp(l) => {
            env.set_stack(l);
            env.set_barrier();
            code.push(AsmInsn::Jmp(l.clone()));
        }
        SmInsn::CJmp(cond, l) => {
            let v = env.pop();
            env.set_stack(l);
            code.push(AsmInsn::Cmp(Opnd::L(0), v));
            code.push(AsmInsn::CJmp(*cond, l.clone()));
        }
        SmInsn::Dup => {
            let top = env.peek().clone();
            let dst = env.allocate();
            move_insn(code, &top, &dst);
        }
        SmInsn::Drop => {
            env.pop();
        }
        SmInsn::Call(f, n) => compile_call(env, code, f, *n, Marshal::Reversed),
        SmInsn::Builtin(f, n) => {
            // runtime entry points for builtins are L-prefixed
            compile_call(env, code, &format!("L{f}"), *n, Marshal::Reversed);
        }
        SmInsn::Elem => compile_call(env, code, "Belem", 2, Marshal::Straight),
        SmInsn::Sta => compile_call(env, code, "Bsta", 3, Marshal::Reversed),
        SmInsn::Array(n) => compile_alloc_call(env, code, "Barray", *n, None),
        SmInsn::Sexp(tag, n) => compile_alloc_call(env, code, "Bsexp", *n, Some(tag)),
        SmInsn::Begin(f, _, n_locals) => {
            env.enter(f, *n_locals);
            code.push(AsmInsn::Push(EBP));
            code.push(AsmInsn::Mov(ESP, EBP));
            code.push(AsmInsn::Binop(
                AsmBinop::Sub,
                Opnd::Sym(format!("{f}_SIZE")),
                ESP,
            ));
        }
        SmInsn::End => {
            if env.fname() == "main" {
                debug_assert!(env.is_empty(), "main ends with a non-empty operand stack");
                code.push(AsmInsn::Mov(EBP, ESP));
                code.push(AsmInsn::Pop(EBP));
                code.push(AsmInsn::Binop(AsmBinop::Xor, EAX, EAX));
            } else {
                // the result must be read out before the frame is torn down
                let result = env.pop();
                code.push(AsmInsn::Mov(result, EAX));
                code.push(AsmInsn::Mov(EBP, ESP));
                code.push(AsmInsn::Pop(EBP));
            }
            code.push(AsmInsn::Ret);
            code.push(AsmInsn::SizeDef(env.fname().to_owned(), env.frame_size()));
        }
    }
}

/// Lowers a complete SM program to an assembly module. SM input comes from
/// the compiler, so any inconsistency found here is a bug, not a user error.
pub fn codegen(prog: &[SmInsn]) -> AsmProg {
    let mut env = CodegenEnv::new();
    let mut text = AsmInsns::new();
    for insn in prog {
        text.push(AsmInsn::Comment(insn.to_string()));
        lower(insn, &mut env, &mut text);
    }
    let (globals, strings) = env.into_data();
    AsmProg {
        globals,
        strings,
        text,
    }
}
