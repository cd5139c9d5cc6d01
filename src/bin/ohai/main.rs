//! The `ohai` binary: drives the lexer, tokenizer, parser, and
//! interpreter over a single source file.

mod cli;

use std::process::ExitCode;
use std::rc::Rc;

use cli::Cli;
use log::debug;
use ohai::error::{ErrorKind, SourceError};
use ohai::interpreter::Interpreter;
use ohai::lexer::Lexer;
use ohai::parser;
use ohai::tokenizer::Tokenizer;

fn main() -> ExitCode {
    let args = Cli::init();
    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let file: Rc<str> = Rc::from(args.file.to_string_lossy().as_ref());

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            let code = SourceError::new(ErrorKind::FileOpenFailed, file, 0)
                .with_image(e.to_string())
                .report();
            return ExitCode::from(code as u8);
        }
    };

    match run(&args, file, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.report() as u8),
    }
}

fn run(args: &Cli, file: Rc<str>, source: &str) -> Result<(), SourceError> {
    let lexemes = Lexer::new(source, file.clone()).lex()?;
    debug!("lexed {} lexemes", lexemes.len());

    let tokens = Tokenizer::new(lexemes).tokenize()?;
    debug!("tokenized {} tokens", tokens.len());

    if args.dump_tokens {
        for tok in &tokens {
            eprintln!("{:?}", tok);
        }
        return Ok(());
    }

    let program = parser::parse(tokens)?;

    if args.dump_ast {
        eprintln!("{:#?}", program);
    }

    let interpreter = Interpreter::new(args.allow_exec);
    interpreter.run(&program)
}
