//! OHAI: an English-phrase-based, dynamically-typed scripting language.
//!
//! The front end is split into three stages that each hand the next a
//! flat, position-tagged sequence: the [`lexer`] segments raw source
//! into [`lexer::Lexeme`]s, the [`tokenizer`] classifies those into
//! [`tokenizer::Token`]s, and the [`parser`] turns the token stream into
//! an [`ast::Program`]. The [`interpreter`] walks that tree directly;
//! there is no intermediate bytecode. Every stage reports failures
//! through the single [`error::SourceError`] type.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod tokenizer;
