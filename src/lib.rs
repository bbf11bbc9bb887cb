/*!
`lamac` is a compiler for a small Lama-flavored source language with
first-class arrays, tagged s-expressions, strings, mutable references and
nested functions with lexical scopes. It targets 32-bit x86 through a
stack-machine intermediate representation and links against a C runtime.

## Command-line options
```shell
Usage: lamac [OPTIONS] FILE

Options:
  -h, --help             Show this message
      --lex              Stop after lexing
      --parse            Stop after parsing
      --sm               Stop after producing stack-machine code
  -i, --interpret        Run the program on the SM interpreter
  -S, --no-assemble      Compile only; do not assemble or link
                         (Output assembly file)
```

## Compilation stages
1. **Lexing** - [lex](lexer::lex) scans the source for tokens together with
   their positions, producing [Tokens](lexer::Tokens); unknown characters
   raise a [LexError](lexer::LexError).
2. **Parsing** - [parse](parser::parse) turns the tokens into an
   [Expr](ast::Expr) tree; syntactic errors raise a
   [ParseError](parser::ParseError). Statement-position values are wrapped
   in `Ignore`, loops are desugared, and calls to the runtime builtins
   (`read`, `write`, `length`) become [Builtin](ast::Expr::Builtin) nodes.
3. **SM compilation** - [compile](sm::compile) lowers the tree to a linear
   stack-machine program ([SmProg](sm::SmProg)) with nested functions
   hoisted to the top level. Unresolvable names raise a
   [CompileError](sm::CompileError); from the next stage on any failure is
   a compiler bug and panics.
4. **Code generation** - [codegen](x86::codegen) lowers the SM program to a
   32-bit x86 assembly module ([AsmProg](x86::AsmProg)) over a symbolic
   operand stack.
5. **Emission** - the [emission] module renders the assembly module as
   AT&T-syntax text via [Display](std::fmt::Display).
6. **Assembly and linkage** - the driver writes `<base>.s` and runs
   `gcc -g -m32` against `$LAMA_RUNTIME/runtime.o` to produce an
   executable.

The [SM interpreter](sm::run) executes SM programs directly and serves as
the reference semantics for the generated code.

## Supported targets
  * **x86-linux-gnu (32 bit)** - the only supported target.
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod ast;
#[cfg(feature = "emission")]
pub mod emission;
#[cfg(feature = "lexer")]
pub mod lexer;
#[cfg(feature = "parser")]
pub mod parser;
#[cfg(feature = "sm")]
pub mod sm;
#[cfg(feature = "x86")]
pub mod x86;
