use std::env;
use std::path::PathBuf;
use std::process::exit;

#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    pub lex: bool,
    pub parse: bool,
    pub sm: bool,
    pub interpret: bool,
    pub no_assemble: bool,
    pub input: PathBuf,
}

impl Args {
    pub fn parse() -> Self {
        let args = env::args();

        let mut lex = false;
        let mut parse = false;
        let mut sm = false;
        let mut interpret = false;
        let mut no_assemble = false;
        let mut input = None;

        for arg in args.skip(1) {
            match arg.as_str() {
                "--lex" => lex = true,
                "--parse" => parse = true,
                "--sm" => sm = true,
                "-i" | "--interpret" => interpret = true,
                "-S" | "--no-assemble" => no_assemble = true,
                "-h" | "--help" => Self::usage(),
                _ => {
                    if input.is_some() {
                        Self::usage();
                    }
                    let file = PathBuf::from(arg);
                    input = Some(file);
                }
            }
        }
        let input = input.unwrap_or_else(|| Self::usage());
        Self {
            lex,
            parse,
            sm,
            interpret,
            no_assemble,
            input,
        }
    }

    #[allow(clippy::items_after_statements)]
    fn usage() -> ! {
        let cmd0 = std::env::args().next().unwrap_or("lamac".to_owned());
        let usage_msg = format!("Usage: {cmd0} [OPTIONS] FILE\n");
        static OPTIONS: &str = concat!(
            "Options:\n",
            "  -h, --help             Show this message\n",
            "      --lex              Stop after lexing\n",
            "      --parse            Stop after parsing\n",
            "      --sm               Stop after producing stack-machine code\n",
            " -i, --interpret         Run the program on the SM interpreter\n",
            " -S, --no-assemble       Compile only; do not assemble or link\n",
            "                         (Output assembly file)\n",
        );
        print!("Lama-flavored language compiler\n\n{usage_msg}\n{OPTIONS}");
        exit(0)
    }
}
