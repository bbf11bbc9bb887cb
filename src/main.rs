#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]

mod args;
mod ast;
mod emission;
mod lexer;
mod parser;
mod sm;
mod x86;

use args::Args;

use std::env;
use std::fs;
use std::io;
use std::process::Command;

use anyhow::{anyhow, Result};
use log::debug;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file_exists = fs::exists(&args.input)?;

    if !file_exists {
        let err_msg = format!("File {} does not exist", args.input.to_string_lossy());
        return Err(anyhow!(err_msg));
    }

    let source = fs::read_to_string(&args.input)?;

    let tokens = lexer::lex(&source)?;
    debug!("lexed {} tokens", tokens.len());

    if args.lex {
        dbg!(tokens);
        return Ok(());
    }

    let ast = parser::parse(&tokens)?;

    if args.parse {
        dbg!(ast);
        return Ok(());
    }

    let prog = sm::compile(ast)?;
    debug!("compiled {} SM instructions", prog.len());

    if args.sm {
        for insn in &prog {
            println!("{insn}");
        }
        return Ok(());
    }

    if args.interpret {
        let stdin = io::stdin();
        let stdout = io::stdout();
        sm::run(&prog, &mut stdin.lock(), &mut stdout.lock())?;
        return Ok(());
    }

    let asm = x86::codegen(&prog);

    let mut asm_file = args.input.clone();
    asm_file.set_extension("s");
    fs::write(&asm_file, asm.to_string())?;
    debug!("wrote {}", asm_file.to_string_lossy());

    if args.no_assemble {
        return Ok(());
    }

    let runtime = env::var("LAMA_RUNTIME").unwrap_or_else(|_| "../runtime".to_owned());
    let mut out_file = args.input.clone();
    out_file.set_extension("");

    let status = Command::new("gcc")
        .arg("-g")
        .arg("-m32")
        .arg("-o")
        .arg(&out_file)
        .arg(format!("{runtime}/runtime.o"))
        .arg(&asm_file)
        .status()?;

    if !status.success() {
        return Err(anyhow!("Failed to run assembler"));
    }

    Ok(())
}
