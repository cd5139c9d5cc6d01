use std::rc::Rc;

use crate::tokenizer::Literal;

use super::{Expression, Identifier, Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Block(pub Vec<Statement>);

#[derive(Debug, Clone, PartialEq)]
pub enum DeclareInit {
    /// `ITZ <expr>`.
    Value(Expression),
    /// `ITZ A <type>`, optionally `LIEK <parent>` when `type` is `BUKKIT`.
    Typed(Type, Option<Identifier>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopUpdate {
    Uppin(Identifier),
    Nerfin(Identifier),
    /// `<caller> IZ <name> YR <var> MKAY`: the loop variable's current
    /// value is passed to the named unary function each iteration, and
    /// the result is assigned back to it.
    Call {
        caller: Identifier,
        name: String,
        var: Identifier,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopGuard {
    Wile(Expression),
    Til(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ExpressionStatement {
        expr: Expression,
        file: Rc<str>,
        line: usize,
    },
    Print {
        parts: Vec<Expression>,
        suppress_newline: bool,
        file: Rc<str>,
        line: usize,
    },
    Input {
        target: Identifier,
        file: Rc<str>,
        line: usize,
    },
    Cast {
        target: Identifier,
        target_type: Type,
        file: Rc<str>,
        line: usize,
    },
    Assign {
        target: Identifier,
        value: Expression,
        file: Rc<str>,
        line: usize,
    },
    Declare {
        scope: Identifier,
        target: String,
        init: Option<DeclareInit>,
        file: Rc<str>,
        line: usize,
    },
    Deallocate {
        target: Identifier,
        file: Rc<str>,
        line: usize,
    },
    IfThenElse {
        then_block: Block,
        else_ifs: Vec<(Expression, Block)>,
        else_block: Option<Block>,
        file: Rc<str>,
        line: usize,
    },
    Switch {
        cases: Vec<(Literal, Block)>,
        default: Option<Block>,
        file: Rc<str>,
        line: usize,
    },
    Break {
        file: Rc<str>,
        line: usize,
    },
    Return {
        value: Option<Expression>,
        file: Rc<str>,
        line: usize,
    },
    Loop {
        name: String,
        update: Option<LoopUpdate>,
        guard: Option<LoopGuard>,
        body: Block,
        file: Rc<str>,
        line: usize,
    },
    FuncDef {
        caller: String,
        name: String,
        params: Vec<String>,
        body: Block,
        file: Rc<str>,
        line: usize,
    },
    AltArrayDef {
        name: String,
        parent: Option<Identifier>,
        body: Block,
        file: Rc<str>,
        line: usize,
    },
    Import {
        name: String,
        file: Rc<str>,
        line: usize,
    },
    /// Registers a native (host-provided) function under `name` in the
    /// enclosing block's function table, the same way `FuncDef` does for
    /// an OHAI-defined one. Never produced by the parser — an embedder
    /// installs the matching implementation on the [`Interpreter`]
    /// (`crate::interpreter::Interpreter::bind_native`) before running a
    /// program that expects one, mirroring how the out-of-scope TCP/UDP
    /// helper module would be wired in as a native collaborator.
    Binding {
        name: String,
        arity: usize,
        file: Rc<str>,
        line: usize,
    },
}

impl Statement {
    pub fn position(&self) -> (Rc<str>, usize) {
        use Statement::*;
        match self {
            ExpressionStatement { file, line, .. }
            | Print { file, line, .. }
            | Input { file, line, .. }
            | Cast { file, line, .. }
            | Assign { file, line, .. }
            | Declare { file, line, .. }
            | Deallocate { file, line, .. }
            | IfThenElse { file, line, .. }
            | Switch { file, line, .. }
            | Break { file, line }
            | Return { file, line, .. }
            | Loop { file, line, .. }
            | FuncDef { file, line, .. }
            | AltArrayDef { file, line, .. }
            | Import { file, line, .. }
            | Binding { file, line, .. } => (file.clone(), *line),
        }
    }
}
