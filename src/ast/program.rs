use std::rc::Rc;

use super::Block;

/// The root of a parsed source file: `HAI <version>`, a block of
/// statements, `KTHXBYE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub version: String,
    pub body: Block,
    pub file: Rc<str>,
}
