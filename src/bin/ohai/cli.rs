//! Command-line argument parsing for the `ohai` binary.

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to an OHAI source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// Log level of the interpreter itself, not of the running program.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,

    /// Enable `I DUZ` system command execution. Disabled by default.
    #[arg(long)]
    pub allow_exec: bool,

    /// Print the token stream to stderr and exit before parsing.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the parsed AST to stderr before executing.
    #[arg(long)]
    pub dump_ast: bool,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
