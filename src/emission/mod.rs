use crate::x86::*;

use std::fmt;

impl fmt::Display for Opnd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::R(i) => write!(f, "{}", REGS[*i]),
            Self::S(i) => {
                if *i >= 0 {
                    write!(f, "-{}(%ebp)", (i + 1) * 4)
                } else {
                    write!(f, "{}(%ebp)", 8 + (-1 - i) * 4)
                }
            }
            Self::M(name) => write!(f, "{name}"),
            Self::L(n) => write!(f, "${n}"),
            Self::Sym(name) => write!(f, "${name}"),
            Self::I(offset, base) => write!(f, "{offset}({base})"),
        }
    }
}

impl fmt::Display for AsmBinop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "addl"),
            Self::Sub => write!(f, "subl"),
            Self::Imul => write!(f, "imull"),
            Self::Xor => write!(f, "xorl"),
            Self::And => write!(f, "andl"),
            Self::Or => write!(f, "orl"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::E => write!(f, "e"),
            Self::Ne => write!(f, "ne"),
            Self::L => write!(f, "l"),
            Self::Le => write!(f, "le"),
            Self::G => write!(f, "g"),
            Self::Ge => write!(f, "ge"),
        }
    }
}

fn reg_to_8bit(opnd: &Opnd) -> &'static str {
    if let Opnd::R(i) = opnd {
        match REGS[*i] {
            "%eax" => "%al",
            "%ebx" => "%bl",
            "%ecx" => "%cl",
            "%edx" => "%dl",
            reg => panic!("{reg} has no byte half"),
        }
    } else {
        panic!("setcc into a non-register operand {opnd:?}")
    }
}

impl fmt::Display for AsmInsn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Comment(text) => write!(f, "# {text}"),
            Self::Mov(src, dst) => write!(f, "movl {src}, {dst}"),
            Self::Lea(src, dst) => write!(f, "leal {src}, {dst}"),
            Self::Binop(op, src, dst) => write!(f, "{op} {src}, {dst}"),
            Self::Cmp(src, dst) => write!(f, "cmpl {src}, {dst}"),
            Self::SetCC(cond, dst) => write!(f, "set{cond} {}", reg_to_8bit(dst)),
            Self::IDiv(op) => write!(f, "idivl {op}"),
            Self::Cltd => write!(f, "cltd"),
            Self::Push(op) => write!(f, "pushl {op}"),
            Self::Pop(op) => write!(f, "popl {op}"),
            Self::Call(name) => write!(f, "call {name}"),
            Self::Jmp(label) => write!(f, "jmp {label}"),
            Self::CJmp(cond, label) => write!(f, "j{cond} {label}"),
            Self::Label(label) => write!(f, "{label}:"),
            Self::Ret => write!(f, "ret"),
            Self::SizeDef(name, bytes) => write!(f, ".set\t{name}_SIZE,\t{bytes}"),
        }
    }
}

impl fmt::Display for AsmProg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\t.data")?;
        for global in &self.globals {
            writeln!(f, "global_{global}:\t.int\t0")?;
        }
        for string in &self.strings {
            writeln!(f, "{}:\t.string\t\"{}\"", string.name, string.escaped)?;
        }
        writeln!(f, "\t.global\tmain")?;
        writeln!(f, "\t.text")?;
        for insn in &self.text {
            match insn {
                AsmInsn::Label(_) | AsmInsn::Comment(_) => writeln!(f, "{insn}")?,
                _ => writeln!(f, "\t{insn}")?,
            }
        }
        Ok(())
    }
}
