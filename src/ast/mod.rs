//! The syntax tree produced by the [parser](crate::parser) and walked by
//! the [interpreter](crate::interpreter). One file per node family,
//! mirroring the front end's own stage-per-file layout.

mod expression;
mod identifier;
mod operator;
mod program;
mod statement;
mod types;

pub use expression::{Constant, Expression};
pub use identifier::{Identifier, IdentifierName};
pub use operator::{Arity, Operator};
pub use program::Program;
pub use statement::{Block, DeclareInit, LoopGuard, LoopUpdate, Statement};
pub use types::Type;
