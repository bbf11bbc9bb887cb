use crate::ast::{BinOp, Identifier};
use crate::sm::insn::{JumpCond, Loc, SmInsn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// A boxed runtime value. Containers are shared, so element assignment
/// through one binding is visible through every other one, exactly as with
/// the heap objects the generated code manipulates.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Str(Rc<RefCell<Vec<u8>>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Sexp(Identifier, Rc<RefCell<Vec<Value>>>),
    Ref(Target),
}

#[derive(Debug, Clone)]
pub enum Target {
    Arg(usize),
    Local(usize),
    Global(Identifier),
}

impl Value {
    fn int(&self) -> i32 {
        match self {
            Self::Int(n) => *n,
            other => panic!("expected an integer, got {other:?}"),
        }
    }
}

struct Frame {
    args: Vec<Value>,
    locals: Vec<Value>,
}

fn target_of(loc: &Loc) -> Target {
    match loc {
        Loc::Arg(i) => Target::Arg(*i),
        Loc::Local(i, _) => Target::Local(*i),
        Loc::Global(name, _) => Target::Global(name.clone()),
        Loc::Fun(label, _) => panic!("{label} does not name a storage location"),
    }
}

struct Machine<'p, 'io> {
    prog: &'p [SmInsn],
    labels: HashMap<&'p str, usize>,
    stack: Vec<Value>,
    globals: HashMap<Identifier, Value>,
    frames: Vec<Frame>,
    rets: Vec<usize>,
    input: &'io mut dyn BufRead,
    output: &'io mut dyn Write,
}

fn eval_binop(op: BinOp, a: i32, b: i32) -> i32 {
    match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Rem => a.wrapping_rem(b),
        BinOp::Eq => i32::from(a == b),
        BinOp::NotEq => i32::from(a != b),
        BinOp::Less => i32::from(a < b),
        BinOp::LessEq => i32::from(a <= b),
        BinOp::Greater => i32::from(a > b),
        BinOp::GreaterEq => i32::from(a >= b),
        BinOp::And => i32::from(a != 0 && b != 0),
        BinOp::Or => i32::from(a != 0 || b != 0),
        BinOp::Xor => a ^ b,
    }
}

impl<'p, 'io> Machine<'p, 'io> {
    fn new(
        prog: &'p [SmInsn],
        input: &'io mut dyn BufRead,
        output: &'io mut dyn Write,
    ) -> Self {
        let labels = prog
            .iter()
            .enumerate()
            .filter_map(|(i, insn)| match insn {
                SmInsn::Label(l) => Some((l.as_str(), i)),
                _ => None,
            })
            .collect();
        Self {
            prog,
            labels,
            stack: Vec::new(),
            globals: HashMap::new(),
            frames: Vec::new(),
            rets: Vec::new(),
            input,
            output,
        }
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("operand stack underflow")
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("no active frame")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("no active frame")
    }

    fn target(&self, l: &str) -> usize {
        *self
            .labels
            .get(l)
            .unwrap_or_else(|| panic!("jump to unknown label {l}"))
    }

    fn load(&self, loc: &Loc) -> Value {
        match loc {
            Loc::Arg(i) => self.frame().args[*i].clone(),
            Loc::Local(i, _) => self.frame().locals[*i].clone(),
            Loc::Global(name, _) => self
                .globals
                .get(name)
                .unwrap_or_else(|| panic!("undeclared global {name}"))
                .clone(),
            Loc::Fun(label, _) => panic!("cannot load function {label} as a value"),
        }
    }

    fn store(&mut self, target: &Target, v: Value) {
        match target {
            Target::Arg(i) => self.frame_mut().args[*i] = v,
            Target::Local(i) => self.frame_mut().locals[*i] = v,
            Target::Global(name) => {
                self.globals.insert(name.clone(), v);
            }
        }
    }

    fn store_elem(&self, container: &Value, index: i32, v: Value) {
        let i = usize::try_from(index).expect("negative index");
        match container {
            Value::Array(elems) | Value::Sexp(_, elems) => elems.borrow_mut()[i] = v,
            Value::Str(bytes) => bytes.borrow_mut()[i] = v.int() as u8,
            other => panic!("element assignment into {other:?}"),
        }
    }

    fn load_elem(&self, container: &Value, index: i32) -> Value {
        let i = usize::try_from(index).expect("negative index");
        match container {
            Value::Array(elems) | Value::Sexp(_, elems) => elems.borrow()[i].clone(),
            Value::Str(bytes) => Value::Int(i32::from(bytes.borrow()[i])),
            other => panic!("element access into {other:?}"),
        }
    }

    fn builtin(&mut self, name: &str, nargs: usize) -> io::Result<()> {
        match (name, nargs) {
            ("read", 0) => {
                let mut line = String::new();
                if self.input.read_line(&mut line)? == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "read: no more input",
                    ));
                }
                let n = line.trim().parse::<i32>().map_err(|err| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("read: {err}"))
                })?;
                self.stack.push(Value::Int(n));
            }
            ("write", 1) => {
                let n = self.pop().int();
                writeln!(self.output, "{n}")?;
                self.stack.push(Value::Int(0));
            }
            ("length", 1) => {
                let v = self.pop();
                let len = match &v {
                    Value::Str(bytes) => bytes.borrow().len(),
                    Value::Array(elems) | Value::Sexp(_, elems) => elems.borrow().len(),
                    other => panic!("length of {other:?}"),
                };
                self.stack.push(Value::Int(len as i32));
            }
            _ => panic!("unknown builtin {name}/{nargs}"),
        }
        Ok(())
    }

    fn run(&mut self) -> io::Result<()> {
        let mut pc = self.target("main");
        loop {
            let insn = &self.prog[pc];
            pc += 1;
            match insn {
                SmInsn::Const(n) => self.stack.push(Value::Int(*n)),
                SmInsn::Str(s) => {
                    // fresh copy on every execution, like the runtime's Bstring
                    let bytes = s.bytes().collect();
                    self.stack.push(Value::Str(Rc::new(RefCell::new(bytes))));
                }
                SmInsn::Binop(op) => {
                    let b = self.pop().int();
                    let a = self.pop().int();
                    self.stack.push(Value::Int(eval_binop(*op, a, b)));
                }
                SmInsn::Array(n) => {
                    // leftmost element is on top of the stack
                    let elems: Vec<Value> = (0..*n).map(|_| self.pop()).collect();
                    self.stack
                        .push(Value::Array(Rc::new(RefCell::new(elems))));
                }
                SmInsn::Sexp(tag, n) => {
                    let elems: Vec<Value> = (0..*n).map(|_| self.pop()).collect();
                    self.stack
                        .push(Value::Sexp(tag.clone(), Rc::new(RefCell::new(elems))));
                }
                SmInsn::Elem => {
                    let index = self.pop().int();
                    let container = self.pop();
                    let elem = self.load_elem(&container, index);
                    self.stack.push(elem);
                }
                SmInsn::Sta => {
                    let v = self.pop();
                    let index = self.pop().int();
                    let container = self.pop();
                    self.store_elem(&container, index, v.clone());
                    self.stack.push(v);
                }
                SmInsn::Dup => {
                    let top = self.stack.last().expect("operand stack underflow").clone();
                    self.stack.push(top);
                }
                SmInsn::Drop => {
                    self.pop();
                }
                SmInsn::Ld(loc) => {
                    let v = self.load(loc);
                    self.stack.push(v);
                }
                SmInsn::Lda(loc) => {
                    self.stack.push(Value::Ref(target_of(loc)));
                }
                SmInsn::St(loc) => {
                    // the stored value stays on the stack
                    let v = self.stack.last().expect("operand stack underflow").clone();
                    let target = target_of(loc);
                    self.store(&target, v);
                }
                SmInsn::Sti => {
                    let v = self.pop();
                    let r = self.pop();
                    let Value::Ref(target) = r else {
                        panic!("STI through a non-reference {r:?}");
                    };
                    self.store(&target, v.clone());
                    self.stack.push(v);
                }
                SmInsn::Global(name) => {
                    self.globals.insert(name.clone(), Value::Int(0));
                }
                SmInsn::Label(_) => (),
                SmInsn::Jmp(l) => pc = self.target(l),
                SmInsn::CJmp(cond, l) => {
                    let v = self.pop().int();
                    let jump = match cond {
                        JumpCond::Z => v == 0,
                        JumpCond::Nz => v != 0,
                    };
                    if jump {
                        pc = self.target(l);
                    }
                }
                SmInsn::Call(f, _) => {
                    self.rets.push(pc);
                    pc = self.target(f);
                }
                SmInsn::Begin(_, nargs, nlocals) => {
                    // the leftmost argument is popped first
                    let args: Vec<Value> = (0..*nargs).map(|_| self.pop()).collect();
                    let locals = vec![Value::Int(0); *nlocals];
                    self.frames.push(Frame { args, locals });
                }
                SmInsn::End => {
                    self.frames.pop();
                    match self.rets.pop() {
                        Some(ret) => pc = ret,
                        None => return Ok(()),
                    }
                }
                SmInsn::Builtin(name, nargs) => self.builtin(name, *nargs)?,
            }
        }
    }
}

/// Runs an SM program against the given input and output. Used by the `-i`
/// driver mode and as the reference semantics in tests.
pub fn run(
    prog: &[SmInsn],
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> io::Result<()> {
    Machine::new(prog, input, output).run()
}
