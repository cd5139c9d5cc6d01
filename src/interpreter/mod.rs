//! The tree-walking evaluator: runs a [`Program`] against a chain of
//! [`Scope`]s, producing side effects (`VISIBLE` output, `GIMMEH` input)
//! and a final exit status via [`SourceError`] propagation.

mod scope;
mod unicode_names;
mod value;

pub use scope::{ArrayTemplate, Function, Scope};
pub use unicode_names::{BuiltinUnicodeNames, UnicodeNameTable};
pub use value::{Bukkit, Value};

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{
    Block, DeclareInit, Expression, Identifier, IdentifierName, LoopGuard, LoopUpdate, Operator,
    Program, Statement, Type,
};
use crate::error::{ErrorKind, SourceError, SourceResult};
use crate::tokenizer::Literal;

#[derive(Debug, PartialEq)]
enum Signal {
    Normal,
    Break,
    Return(Value),
}

pub struct Interpreter {
    allow_exec: bool,
    unicode_names: Box<dyn UnicodeNameTable>,
    natives: std::collections::HashMap<String, scope::NativeFn>,
}

impl Interpreter {
    pub fn new(allow_exec: bool) -> Self {
        Self {
            allow_exec,
            unicode_names: Box::new(BuiltinUnicodeNames),
            natives: std::collections::HashMap::new(),
        }
    }

    pub fn with_unicode_names(allow_exec: bool, table: Box<dyn UnicodeNameTable>) -> Self {
        Self { allow_exec, unicode_names: table, natives: std::collections::HashMap::new() }
    }

    /// Installs a native implementation for a `Binding` statement named
    /// `name`. Has no effect on programs that don't declare a matching
    /// binding; call this before [`Interpreter::run`].
    pub fn bind_native(
        &mut self,
        name: impl Into<String>,
        implementation: impl Fn(&[Value]) -> SourceResult<Value> + 'static,
    ) {
        self.natives.insert(name.into(), Rc::new(implementation));
    }

    pub fn run(&self, program: &Program) -> SourceResult<()> {
        let root = Scope::root();
        self.execute_block(&program.body, &root)?;
        Ok(())
    }

    fn hoist_block(&self, block: &Block, scope: &Rc<RefCell<Scope>>) {
        for stmt in &block.0 {
            match stmt {
                Statement::FuncDef { name, params, body, .. } => {
                    let func = Rc::new(Function::Defined {
                        params: params.clone(),
                        body: body.clone(),
                        closure: scope.clone(),
                    });
                    scope.borrow_mut().register_function(name.clone(), func);
                }
                Statement::AltArrayDef { name, parent, body, .. } => {
                    let parent_name = parent.as_ref().and_then(|p| match &p.name {
                        IdentifierName::Direct(s) => Some(s.clone()),
                        IdentifierName::Indirect(_) => None,
                    });
                    let tpl = Rc::new(ArrayTemplate {
                        parent: parent_name,
                        body: body.clone(),
                        closure: scope.clone(),
                    });
                    scope.borrow_mut().register_array_template(name.clone(), tpl);
                }
                Statement::Binding { name, arity, .. } => {
                    if let Some(implementation) = self.natives.get(name) {
                        let func = Rc::new(Function::Native { arity: *arity, implementation: implementation.clone() });
                        scope.borrow_mut().register_function(name.clone(), func);
                    }
                }
                _ => {}
            }
        }
    }

    fn execute_block(&self, block: &Block, scope: &Rc<RefCell<Scope>>) -> SourceResult<Signal> {
        self.hoist_block(block, scope);
        for stmt in &block.0 {
            match self.execute_statement(stmt, scope)? {
                Signal::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::Normal)
    }

    fn execute_statement(&self, stmt: &Statement, scope: &Rc<RefCell<Scope>>) -> SourceResult<Signal> {
        match stmt {
            Statement::ExpressionStatement { expr, .. } => {
                let v = self.eval(expr, scope)?;
                scope.borrow_mut().it = v;
                Ok(Signal::Normal)
            }
            Statement::Print { parts, suppress_newline, .. } => {
                let mut out = String::new();
                for p in parts {
                    let v = self.eval(p, scope)?;
                    out.push_str(&self.to_yarn(&v));
                }
                if *suppress_newline {
                    print!("{out}");
                } else {
                    println!("{out}");
                }
                scope.borrow_mut().it = Value::Str(out);
                Ok(Signal::Normal)
            }
            Statement::Input { target, .. } => {
                let mut buf = String::new();
                std::io::stdin().read_line(&mut buf).unwrap_or(0);
                let trimmed = buf.trim_end_matches(['\n', '\r']).to_owned();
                self.write_identifier(target, Value::Str(trimmed), scope)?;
                Ok(Signal::Normal)
            }
            Statement::Cast { target, target_type, file, line } => {
                let current = self.read_identifier(target, scope)?;
                let casted = self.cast(&current, *target_type, file, *line)?;
                self.write_identifier(target, casted, scope)?;
                Ok(Signal::Normal)
            }
            Statement::Assign { target, value, .. } => {
                let v = self.eval(value, scope)?;
                self.write_identifier(target, v, scope)?;
                Ok(Signal::Normal)
            }
            Statement::Declare { scope: scope_ident, target, init, file, line } => {
                self.resolve_name(scope_ident, scope)?;
                if scope.borrow().has_own(target) {
                    return Err(SourceError::new(ErrorKind::RuntimeRedefinition, file.clone(), *line)
                        .with_image(target.clone()));
                }
                let value = match init {
                    None => Value::Noob,
                    Some(DeclareInit::Value(expr)) => self.eval(expr, scope)?,
                    Some(DeclareInit::Typed(ty, parent)) => match ty {
                        Type::Bukkit => self.make_bukkit(parent.as_ref(), scope)?,
                        Type::Noob => Value::Noob,
                        Type::Troof => Value::Bool(false),
                        Type::Numbr => Value::Int(0),
                        Type::Numbar => Value::Float(0.0),
                        Type::Yarn => Value::Str(String::new()),
                    },
                };
                scope.borrow_mut().declare(target.clone(), value);
                Ok(Signal::Normal)
            }
            Statement::Deallocate { target, .. } => {
                let name = self.resolve_name(target, scope)?;
                scope.borrow_mut().remove(&name);
                Ok(Signal::Normal)
            }
            Statement::IfThenElse { then_block, else_ifs, else_block, file, line } => {
                let it = scope.borrow().it.clone();
                if self.to_bool(&it, file, *line)? {
                    return self.execute_block(then_block, scope);
                }
                for (guard, block) in else_ifs {
                    if self.eval_bool(guard, scope)? {
                        return self.execute_block(block, scope);
                    }
                }
                if let Some(block) = else_block {
                    return self.execute_block(block, scope);
                }
                Ok(Signal::Normal)
            }
            Statement::Switch { cases, default, .. } => self.execute_switch(cases, default, scope),
            Statement::Break { .. } => Ok(Signal::Break),
            Statement::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval(e, scope)?,
                    None => Value::Noob,
                };
                Ok(Signal::Return(v))
            }
            Statement::Loop { update, guard, body, .. } => self.execute_loop(update, guard, body, scope),
            Statement::FuncDef { .. }
            | Statement::AltArrayDef { .. }
            | Statement::Import { .. }
            | Statement::Binding { .. } => Ok(Signal::Normal),
        }
    }

    fn execute_switch(
        &self,
        cases: &[(Literal, Block)],
        default: &Option<Block>,
        scope: &Rc<RefCell<Scope>>,
    ) -> SourceResult<Signal> {
        let it = scope.borrow().it.clone();
        let start = cases.iter().position(|(lit, _)| self.value_matches_literal(&it, lit));
        let Some(start) = start else {
            return match default {
                Some(block) => match self.execute_block(block, scope)? {
                    Signal::Break => Ok(Signal::Normal),
                    other => Ok(other),
                },
                None => Ok(Signal::Normal),
            };
        };
        for (_, block) in &cases[start..] {
            match self.execute_block(block, scope)? {
                Signal::Break => return Ok(Signal::Normal),
                Signal::Return(v) => return Ok(Signal::Return(v)),
                Signal::Normal => {}
            }
        }
        if let Some(block) = default {
            if let Signal::Return(v) = self.execute_block(block, scope)? {
                return Ok(Signal::Return(v));
            }
        }
        Ok(Signal::Normal)
    }

    fn execute_loop(
        &self,
        update: &Option<LoopUpdate>,
        guard: &Option<LoopGuard>,
        body: &Block,
        scope: &Rc<RefCell<Scope>>,
    ) -> SourceResult<Signal> {
        self.declare_loop_variable(update, scope);
        loop {
            if let Some(g) = guard {
                let (expr, negate) = match g {
                    LoopGuard::Wile(e) => (e, false),
                    LoopGuard::Til(e) => (e, true),
                };
                let mut proceed = self.eval_bool(expr, scope)?;
                if negate {
                    proceed = !proceed;
                }
                if !proceed {
                    break;
                }
            }
            match self.execute_block(body, scope)? {
                Signal::Break => break,
                Signal::Return(v) => return Ok(Signal::Return(v)),
                Signal::Normal => {}
            }
            if let Some(u) = update {
                match u {
                    LoopUpdate::Uppin(ident) => self.bump(ident, 1, scope)?,
                    LoopUpdate::Nerfin(ident) => self.bump(ident, -1, scope)?,
                    LoopUpdate::Call { name, var, .. } => {
                        let current = self.read_identifier(var, scope)?;
                        let result =
                            self.call_function_values(name, vec![current], scope, &var.file, var.line)?;
                        self.write_identifier(var, result, scope)?;
                    }
                }
            }
        }
        Ok(Signal::Normal)
    }

    /// `IM IN YR <name> UPPIN/NERFIN YR <var> ...` implicitly creates
    /// `<var>` as `0` if it isn't already declared anywhere on the scope
    /// chain, the same way the loop variable of a bare `IM IN YR` with no
    /// prior `I HAS A` is expected to just work. Only direct identifiers
    /// are eligible — an `SRS <expr>` indirect name is resolved, not
    /// declared, so there is nothing to pre-seed.
    fn declare_loop_variable(&self, update: &Option<LoopUpdate>, scope: &Rc<RefCell<Scope>>) {
        let ident = match update {
            Some(LoopUpdate::Uppin(ident)) | Some(LoopUpdate::Nerfin(ident)) => Some(ident),
            Some(LoopUpdate::Call { var, .. }) => Some(var),
            None => None,
        };
        if let Some(ident) = ident {
            if let IdentifierName::Direct(name) = &ident.name {
                if Scope::get(scope, name).is_none() {
                    scope.borrow_mut().declare(name.clone(), Value::Int(0));
                }
            }
        }
    }

    fn bump(&self, ident: &Identifier, delta: i64, scope: &Rc<RefCell<Scope>>) -> SourceResult<()> {
        let current = self.read_identifier(ident, scope)?;
        let coerced = self.coerce_numeric(&current, &ident.file, ident.line)?;
        let updated = match coerced {
            Value::Int(i) => Value::Int(i + delta),
            Value::Float(f) => Value::Float(f + delta as f64),
            _ => unreachable!("coerce_numeric only returns Int or Float"),
        };
        self.write_identifier(ident, updated, scope)
    }

    /// Builds the `BUKKIT` value for `ITZ A BUKKIT [LIEK <parent>]`.
    /// `<parent>` conventionally names an `OH HAI IM` template, which is
    /// instantiated by replaying its body; if no template is registered
    /// under that name it falls back to treating `<parent>` as an
    /// existing `BUKKIT` value to prototype-inherit from.
    fn make_bukkit(&self, parent: Option<&Identifier>, scope: &Rc<RefCell<Scope>>) -> SourceResult<Value> {
        let Some(parent_ident) = parent else {
            return Ok(Value::new_bukkit(None));
        };
        if let IdentifierName::Direct(name) = &parent_ident.name {
            if let Some(tpl) = Scope::lookup_array_template(scope, name) {
                return self.instantiate_template(&tpl);
            }
        }
        match self.read_identifier(parent_ident, scope)? {
            Value::Bukkit(b) => Ok(Value::new_bukkit(Some(b))),
            other => Err(SourceError::new(ErrorKind::RuntimeCastFailure, parent_ident.file.clone(), parent_ident.line)
                .with_image(self.to_yarn(&other))
                .with_expected("BUKKIT")),
        }
    }

    /// Replays an `OH HAI IM` template's body against a fresh scope
    /// child of the template's closure, then harvests whatever that
    /// scope declared into the new `BUKKIT`'s slots.
    fn instantiate_template(&self, tpl: &ArrayTemplate) -> SourceResult<Value> {
        let parent_bukkit = match &tpl.parent {
            Some(pname) => match Scope::lookup_array_template(&tpl.closure, pname) {
                Some(parent_tpl) => match self.instantiate_template(&parent_tpl)? {
                    Value::Bukkit(b) => Some(b),
                    _ => None,
                },
                None => None,
            },
            None => None,
        };
        let value = Value::new_bukkit(parent_bukkit);
        let body_scope = Scope::child(&tpl.closure);
        self.execute_block(&tpl.body, &body_scope)?;
        if let Value::Bukkit(b) = &value {
            for (name, v) in body_scope.borrow().own_vars() {
                b.borrow_mut().slots.insert(name.clone(), v.clone());
            }
        }
        Ok(value)
    }

    fn call_function(
        &self,
        name: &str,
        args: &[Expression],
        scope: &Rc<RefCell<Scope>>,
        file: &Rc<str>,
        line: usize,
    ) -> SourceResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            values.push(self.eval(a, scope)?);
        }
        self.call_function_values(name, values, scope, file, line)
    }

    /// Shared by [`Interpreter::call_function`] and the function-call
    /// form of a loop's update clause, which already has a value (the
    /// loop variable) rather than an unevaluated argument expression.
    fn call_function_values(
        &self,
        name: &str,
        values: Vec<Value>,
        scope: &Rc<RefCell<Scope>>,
        file: &Rc<str>,
        line: usize,
    ) -> SourceResult<Value> {
        let func = Scope::lookup_function(scope, name).ok_or_else(|| {
            SourceError::new(ErrorKind::RuntimeUndefinedFunction, file.clone(), line).with_image(name.to_owned())
        })?;
        match func.as_ref() {
            Function::Defined { params, body, closure } => {
                if values.len() != params.len() {
                    return Err(SourceError::new(ErrorKind::RuntimeWrongArgumentCount, file.clone(), line)
                        .with_image(name.to_owned())
                        .with_expected(params.len().to_string()));
                }
                let call_scope = Scope::child(closure);
                for (p, v) in params.iter().zip(values) {
                    call_scope.borrow_mut().declare(p.clone(), v);
                }
                match self.execute_block(body, &call_scope)? {
                    Signal::Return(v) => Ok(v),
                    Signal::Break | Signal::Normal => Ok(Value::Noob),
                }
            }
            Function::Native { arity, implementation } => {
                if values.len() != *arity {
                    return Err(SourceError::new(ErrorKind::RuntimeWrongArgumentCount, file.clone(), line)
                        .with_image(name.to_owned())
                        .with_expected(arity.to_string()));
                }
                implementation(&values)
            }
        }
    }

    fn resolve_name(&self, ident: &Identifier, scope: &Rc<RefCell<Scope>>) -> SourceResult<String> {
        match &ident.name {
            IdentifierName::Direct(s) => Ok(s.clone()),
            IdentifierName::Indirect(expr) => {
                let v = self.eval(expr, scope)?;
                Ok(self.to_yarn(&v))
            }
        }
    }

    fn read_identifier(&self, ident: &Identifier, scope: &Rc<RefCell<Scope>>) -> SourceResult<Value> {
        let name = self.resolve_name(ident, scope)?;
        let base = Scope::get(scope, &name).ok_or_else(|| {
            SourceError::new(ErrorKind::RuntimeUndefinedName, ident.file.clone(), ident.line).with_image(name.clone())
        })?;
        match &ident.slot {
            None => Ok(base),
            Some(slot_expr) => {
                let key = self.to_yarn(&self.eval(slot_expr, scope)?);
                match &base {
                    Value::Bukkit(b) => b.borrow().get(&key).ok_or_else(|| {
                        SourceError::new(ErrorKind::RuntimeUndefinedName, ident.file.clone(), ident.line)
                            .with_image(key.clone())
                    }),
                    _ => Err(SourceError::new(ErrorKind::RuntimeSubscriptOfNonArray, ident.file.clone(), ident.line)
                        .with_image(name)),
                }
            }
        }
    }

    fn write_identifier(&self, ident: &Identifier, value: Value, scope: &Rc<RefCell<Scope>>) -> SourceResult<()> {
        let name = self.resolve_name(ident, scope)?;
        match &ident.slot {
            None => {
                if !Scope::set(scope, &name, value) {
                    return Err(SourceError::new(ErrorKind::RuntimeUndefinedName, ident.file.clone(), ident.line)
                        .with_image(name));
                }
                Ok(())
            }
            Some(slot_expr) => {
                let base = Scope::get(scope, &name).ok_or_else(|| {
                    SourceError::new(ErrorKind::RuntimeUndefinedName, ident.file.clone(), ident.line)
                        .with_image(name.clone())
                })?;
                let key = self.to_yarn(&self.eval(slot_expr, scope)?);
                match base {
                    Value::Bukkit(b) => {
                        b.borrow_mut().slots.insert(key, value);
                        Ok(())
                    }
                    _ => Err(SourceError::new(ErrorKind::RuntimeSubscriptOfNonArray, ident.file.clone(), ident.line)
                        .with_image(name)),
                }
            }
        }
    }

    fn eval(&self, expr: &Expression, scope: &Rc<RefCell<Scope>>) -> SourceResult<Value> {
        match expr {
            Expression::Constant(c) => match &c.value {
                Literal::Str(s) => Ok(Value::Str(self.interpolate(s, scope, &c.file, c.line)?)),
                Literal::Int(i) => Ok(Value::Int(*i)),
                Literal::Float(f) => Ok(Value::Float(*f)),
                Literal::Bool(b) => Ok(Value::Bool(*b)),
            },
            Expression::Identifier(ident) => self.read_identifier(ident, scope),
            Expression::ImplicitVariable { .. } => Ok(scope.borrow().it.clone()),
            Expression::Cast { expr, target, file, line } => {
                let v = self.eval(expr, scope)?;
                self.cast(&v, *target, file, *line)
            }
            Expression::Operator { op, operands, file, line } => self.eval_operator(*op, operands, scope, file, *line),
            Expression::FunctionCall { name, args, file, line, .. } => {
                self.call_function(name, args, scope, file, *line)
            }
            Expression::SystemCommand { command, file, line } => self.eval_system_command(command, scope, file, *line),
        }
    }

    fn eval_bool(&self, expr: &Expression, scope: &Rc<RefCell<Scope>>) -> SourceResult<bool> {
        let v = self.eval(expr, scope)?;
        let (file, line) = expr.position();
        self.to_bool(&v, &file, line)
    }

    fn eval_operator(
        &self,
        op: Operator,
        operands: &[Expression],
        scope: &Rc<RefCell<Scope>>,
        file: &Rc<str>,
        line: usize,
    ) -> SourceResult<Value> {
        use Operator::*;
        match op {
            Sum | Diff | Produkt | Quoshunt | Mod | Biggr | Smallr => {
                let a = self.eval(&operands[0], scope)?;
                let b = self.eval(&operands[1], scope)?;
                self.arith(op, &a, &b, file, line)
            }
            Both => Ok(Value::Bool(self.eval_bool(&operands[0], scope)? && self.eval_bool(&operands[1], scope)?)),
            Either => Ok(Value::Bool(self.eval_bool(&operands[0], scope)? || self.eval_bool(&operands[1], scope)?)),
            Won => Ok(Value::Bool(self.eval_bool(&operands[0], scope)? ^ self.eval_bool(&operands[1], scope)?)),
            BothSaem => {
                let a = self.eval(&operands[0], scope)?;
                let b = self.eval(&operands[1], scope)?;
                Ok(Value::Bool(self.checked_value_equal(&a, &b, file, line)?))
            }
            Diffrint => {
                let a = self.eval(&operands[0], scope)?;
                let b = self.eval(&operands[1], scope)?;
                Ok(Value::Bool(!self.checked_value_equal(&a, &b, file, line)?))
            }
            Not => Ok(Value::Bool(!self.eval_bool(&operands[0], scope)?)),
            All => {
                for o in operands {
                    if !self.eval_bool(o, scope)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Any => {
                for o in operands {
                    if self.eval_bool(o, scope)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Smoosh => {
                let mut s = String::new();
                for o in operands {
                    let v = self.eval(o, scope)?;
                    s.push_str(&self.to_yarn(&v));
                }
                Ok(Value::Str(s))
            }
        }
    }

    fn eval_system_command(
        &self,
        command: &Expression,
        scope: &Rc<RefCell<Scope>>,
        file: &Rc<str>,
        line: usize,
    ) -> SourceResult<Value> {
        if !self.allow_exec {
            return Err(SourceError::new(ErrorKind::RuntimeCommandExecutionFailure, file.clone(), line)
                .with_image("execution disabled; rerun with --allow-exec"));
        }
        let cmd = self.to_yarn(&self.eval(command, scope)?);
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        let output = std::process::Command::new(shell)
            .arg(flag)
            .arg(&cmd)
            .output()
            .map_err(|e| {
                SourceError::new(ErrorKind::RuntimeCommandExecutionFailure, file.clone(), line).with_image(e.to_string())
            })?;
        if !output.status.success() {
            return Err(SourceError::new(ErrorKind::RuntimeCommandExecutionFailure, file.clone(), line)
                .with_image(format!("command exited with {:?}", output.status.code())));
        }
        Ok(Value::Str(String::from_utf8_lossy(&output.stdout).trim().to_owned()))
    }

    /// Expands the escape forms recognized inside a string literal: `:)`
    /// newline, `:>` tab, `:o` bell, `:"` literal quote, `::` literal
    /// colon, `:(hex)` a codepoint by hex value, `:[NAME]` a codepoint by
    /// Unicode name, `:{var}` the named variable's value, coerced to YARN.
    fn interpolate(&self, raw: &str, scope: &Rc<RefCell<Scope>>, file: &Rc<str>, line: usize) -> SourceResult<String> {
        let mut out = String::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c != ':' {
                out.push(c);
                continue;
            }
            match chars.next() {
                None => out.push(':'),
                Some(')') => out.push('\n'),
                Some('>') => out.push('\t'),
                Some('o') => out.push('\u{0007}'),
                Some('"') => out.push('"'),
                Some(':') => out.push(':'),
                Some('(') => {
                    let mut hex = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(h) => hex.push(h),
                            None => {
                                return Err(SourceError::new(ErrorKind::RuntimeUnclosedEscape, file.clone(), line)
                                    .with_image("("))
                            }
                        }
                    }
                    let code = u32::from_str_radix(&hex, 16).map_err(|_| {
                        SourceError::new(ErrorKind::RuntimeBadHexEscape, file.clone(), line).with_image(hex.clone())
                    })?;
                    if code == 0 {
                        return Err(SourceError::new(ErrorKind::RuntimeNonPositiveCodepoint, file.clone(), line)
                            .with_image(hex));
                    }
                    let ch = char::from_u32(code).ok_or_else(|| {
                        SourceError::new(ErrorKind::RuntimeBadHexEscape, file.clone(), line).with_image(hex.clone())
                    })?;
                    out.push(ch);
                }
                Some('[') => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(h) => name.push(h),
                            None => {
                                return Err(SourceError::new(ErrorKind::RuntimeUnclosedEscape, file.clone(), line)
                                    .with_image("["))
                            }
                        }
                    }
                    let ch = self.unicode_names.lookup(&name).ok_or_else(|| {
                        SourceError::new(ErrorKind::RuntimeBadHexEscape, file.clone(), line).with_image(name.clone())
                    })?;
                    out.push(ch);
                }
                Some('{') => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(h) => name.push(h),
                            None => {
                                return Err(SourceError::new(ErrorKind::RuntimeUnclosedEscape, file.clone(), line)
                                    .with_image("{"))
                            }
                        }
                    }
                    let value = Scope::get(scope, &name).ok_or_else(|| {
                        SourceError::new(ErrorKind::RuntimeUndefinedName, file.clone(), line).with_image(name.clone())
                    })?;
                    out.push_str(&self.to_yarn(&value));
                }
                Some(other) => {
                    out.push(':');
                    out.push(other);
                }
            }
        }
        Ok(out)
    }

    fn to_bool(&self, v: &Value, file: &Rc<str>, line: usize) -> SourceResult<bool> {
        match v {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Noob => Ok(false),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Bukkit(_) => Err(SourceError::new(ErrorKind::RuntimeBooleanCastFailure, file.clone(), line)
                .with_image("BUKKIT")),
        }
    }

    fn to_yarn(&self, v: &Value) -> String {
        match v {
            Value::Noob => String::new(),
            Value::Bool(b) => if *b { "WIN" } else { "FAIL" }.to_owned(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{f:.2}"),
            Value::Str(s) => s.clone(),
            Value::Bukkit(_) => "BUKKIT".to_owned(),
        }
    }

    fn coerce_numeric(&self, v: &Value, file: &Rc<str>, line: usize) -> SourceResult<Value> {
        match v {
            Value::Int(_) | Value::Float(_) => Ok(v.clone()),
            Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
            Value::Noob => Ok(Value::Int(0)),
            Value::Str(s) => {
                if let Ok(i) = s.parse::<i64>() {
                    Ok(Value::Int(i))
                } else if let Ok(f) = s.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Err(SourceError::new(ErrorKind::RuntimeOperandType, file.clone(), line).with_image(s.clone()))
                }
            }
            Value::Bukkit(_) => {
                Err(SourceError::new(ErrorKind::RuntimeOperandType, file.clone(), line).with_image("BUKKIT"))
            }
        }
    }

    fn arith(&self, op: Operator, a: &Value, b: &Value, file: &Rc<str>, line: usize) -> SourceResult<Value> {
        use Operator::*;
        let ca = self.coerce_numeric(a, file, line)?;
        let cb = self.coerce_numeric(b, file, line)?;
        if matches!(ca, Value::Float(_)) || matches!(cb, Value::Float(_)) {
            let fa = match ca {
                Value::Int(i) => i as f64,
                Value::Float(f) => f,
                _ => unreachable!(),
            };
            let fb = match cb {
                Value::Int(i) => i as f64,
                Value::Float(f) => f,
                _ => unreachable!(),
            };
            let result = match op {
                Sum => fa + fb,
                Diff => fa - fb,
                Produkt => fa * fb,
                Quoshunt => {
                    if fb == 0.0 {
                        return Err(SourceError::new(ErrorKind::RuntimeDivisionByZero, file.clone(), line));
                    }
                    fa / fb
                }
                Mod => {
                    if fb == 0.0 {
                        return Err(SourceError::new(ErrorKind::RuntimeDivisionByZero, file.clone(), line));
                    }
                    fa % fb
                }
                Biggr => fa.max(fb),
                Smallr => fa.min(fb),
                _ => unreachable!("only arithmetic operators reach here"),
            };
            Ok(Value::Float(result))
        } else {
            let ia = match ca {
                Value::Int(i) => i,
                _ => unreachable!(),
            };
            let ib = match cb {
                Value::Int(i) => i,
                _ => unreachable!(),
            };
            let result = match op {
                Sum => ia.wrapping_add(ib),
                Diff => ia.wrapping_sub(ib),
                Produkt => ia.wrapping_mul(ib),
                Quoshunt => {
                    if ib == 0 {
                        return Err(SourceError::new(ErrorKind::RuntimeDivisionByZero, file.clone(), line));
                    }
                    ia / ib
                }
                Mod => {
                    if ib == 0 {
                        return Err(SourceError::new(ErrorKind::RuntimeDivisionByZero, file.clone(), line));
                    }
                    ia % ib
                }
                Biggr => ia.max(ib),
                Smallr => ia.min(ib),
                _ => unreachable!("only arithmetic operators reach here"),
            };
            Ok(Value::Int(result))
        }
    }

    fn value_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Noob, Value::Noob) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => ((x - y).abs() as f32) < f32::EPSILON,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
                ((*x as f64 - y).abs() as f32) < f32::EPSILON
            }
            _ => false,
        }
    }

    /// `BOTH SAEM`/`DIFFRINT`'s equality check: unlike [`Self::value_equal`]
    /// (used for silent switch-case matching), comparing values of
    /// incompatible types here is a runtime error per spec — "Equality
    /// across incompatible types is an error (not false)" — rather than
    /// collapsing to `FAIL`. Numeric cross-comparison (`Int`/`Float`) and
    /// same-type pairs are the only compatible shapes; `BUKKIT` compares
    /// by reference identity.
    fn checked_value_equal(&self, a: &Value, b: &Value, file: &Rc<str>, line: usize) -> SourceResult<bool> {
        match (a, b) {
            (Value::Noob, Value::Noob)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Int(_), Value::Int(_))
            | (Value::Float(_), Value::Float(_))
            | (Value::Str(_), Value::Str(_))
            | (Value::Int(_), Value::Float(_))
            | (Value::Float(_), Value::Int(_)) => Ok(self.value_equal(a, b)),
            (Value::Bukkit(x), Value::Bukkit(y)) => Ok(Rc::ptr_eq(x, y)),
            _ => Err(SourceError::new(ErrorKind::RuntimeOperandType, file.clone(), line)
                .with_image(format!("{} vs {}", self.to_yarn(a), self.to_yarn(b)))),
        }
    }

    fn literal_to_value(&self, lit: &Literal) -> Value {
        match lit {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }

    fn value_matches_literal(&self, v: &Value, lit: &Literal) -> bool {
        self.value_equal(v, &self.literal_to_value(lit))
    }

    fn cast(&self, value: &Value, target: Type, file: &Rc<str>, line: usize) -> SourceResult<Value> {
        match target {
            Type::Noob => Ok(Value::Noob),
            Type::Troof => Ok(Value::Bool(self.to_bool(value, file, line)?)),
            Type::Numbr => match value {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Float(f) => Ok(Value::Int(*f as i64)),
                Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
                Value::Noob => Ok(Value::Int(0)),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| SourceError::new(ErrorKind::RuntimeIntegerCastFailure, file.clone(), line).with_image(s.clone())),
                Value::Bukkit(_) => Err(SourceError::new(ErrorKind::RuntimeCastFailure, file.clone(), line)
                    .with_image("BUKKIT")
                    .with_expected("NUMBR")),
            },
            Type::Numbar => match value {
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::Noob => Ok(Value::Float(0.0)),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| SourceError::new(ErrorKind::RuntimeFloatCastFailure, file.clone(), line).with_image(s.clone())),
                Value::Bukkit(_) => Err(SourceError::new(ErrorKind::RuntimeCastFailure, file.clone(), line)
                    .with_image("BUKKIT")
                    .with_expected("NUMBAR")),
            },
            Type::Yarn => Ok(Value::Str(self.to_yarn(value))),
            Type::Bukkit => match value {
                Value::Bukkit(_) => Ok(value.clone()),
                _ => Err(SourceError::new(ErrorKind::RuntimeCastFailure, file.clone(), line)
                    .with_image(self.to_yarn(value))
                    .with_expected("BUKKIT")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser;
    use crate::tokenizer::Tokenizer;
    use std::rc::Rc;

    fn run(src: &str) -> SourceResult<()> {
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new(src, file).lex().unwrap();
        let tokens = Tokenizer::new(lexemes).tokenize().unwrap();
        let program = parser::parse(tokens).unwrap();
        Interpreter::new(false).run(&program)
    }

    fn run_and_read(src: &str, name: &str) -> Value {
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new(src, file).lex().unwrap();
        let tokens = Tokenizer::new(lexemes).tokenize().unwrap();
        let program = parser::parse(tokens).unwrap();
        let root = Scope::root();
        Interpreter::new(false).execute_block(&program.body, &root).unwrap();
        Scope::get(&root, name).expect("name should be declared")
    }

    #[test]
    fn arithmetic_promotes_to_float_when_either_operand_is() {
        let src = "HAI 1.2\nI HAS A X ITZ SUM OF 1 AN 0.5\nKTHXBYE\n";
        run(src).unwrap();
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let src = "HAI 1.2\nI HAS A X ITZ QUOSHUNT OF 1 AN 0\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeDivisionByZero);
    }

    #[test]
    fn redeclaring_a_name_in_the_same_scope_errors() {
        let src = "HAI 1.2\nI HAS A X\nI HAS A X\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeRedefinition);
    }

    #[test]
    fn assigning_an_undeclared_name_errors() {
        let src = "HAI 1.2\nX R 3\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeUndefinedName);
    }

    #[test]
    fn loop_variable_is_implicitly_declared_as_zero() {
        // Spec §8 scenario 3: `I` is never declared before the loop.
        let src = concat!(
            "HAI 1.2\n",
            "I HAS A N ITZ 5\n",
            "I HAS A F ITZ 1\n",
            "IM IN YR L UPPIN YR I TIL BOTH SAEM I AN N\n",
            "F R PRODUKT OF F AN SUM OF I AN 1\n",
            "IM OUTTA YR L\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "F"), Value::Int(120));
    }

    #[test]
    fn non_empty_string_coerces_to_a_true_boolean() {
        let src = concat!(
            "HAI 1.2\n",
            "I HAS A X ITZ 0\n",
            "\"hello\"\n",
            "O RLY?\n",
            "YA RLY\n",
            "X R 1\n",
            "OIC\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "X"), Value::Int(1));
    }

    #[test]
    fn visible_updates_it_like_a_bare_expression_statement() {
        // spec §4.4: "print-like statements also update it".
        let src = concat!(
            "HAI 1.2\n",
            "I HAS A X ITZ 0\n",
            "VISIBLE \"y\"\n",
            "O RLY?\n",
            "YA RLY\n",
            "X R 1\n",
            "OIC\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "X"), Value::Int(1));
    }

    #[test]
    fn empty_string_coerces_to_a_false_boolean() {
        let src = concat!(
            "HAI 1.2\n",
            "I HAS A X ITZ 0\n",
            "\"\"\n",
            "O RLY?\n",
            "YA RLY\n",
            "X R 1\n",
            "NO WAI\n",
            "X R 2\n",
            "OIC\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "X"), Value::Int(2));
    }

    #[test]
    fn both_saem_on_incompatible_types_is_a_runtime_error() {
        let src = "HAI 1.2\nBOTH SAEM 1 AN \"x\"\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeOperandType);
    }

    #[test]
    fn diffrint_on_incompatible_types_is_a_runtime_error() {
        let src = "HAI 1.2\nDIFFRINT WIN AN 1\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeOperandType);
    }

    #[test]
    fn both_saem_on_numeric_cross_types_still_compares_by_value() {
        let src = "HAI 1.2\nI HAS A X ITZ BOTH SAEM 1 AN 1.0\nKTHXBYE\n";
        assert_eq!(run_and_read(src, "X"), Value::Bool(true));
    }

    #[test]
    fn loop_with_til_guard_and_uppin_update_runs_expected_iterations() {
        let src = concat!(
            "HAI 1.2\n",
            "I HAS A I ITZ 0\n",
            "I HAS A N ITZ 0\n",
            "IM IN YR LOOP UPPIN YR I TIL BOTH SAEM I AN 3\n",
            "N R SUM OF N AN 1\n",
            "IM OUTTA YR LOOP\n",
            "KTHXBYE\n",
        );
        run(src).unwrap();
    }

    #[test]
    fn system_command_is_disabled_by_default() {
        let src = "HAI 1.2\nI HAS A X ITZ I DUZ \"echo hi\"\nKTHXBYE\n";
        let err = run(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeCommandExecutionFailure);
    }

    #[test]
    fn recursive_function_call_returns_a_value() {
        let src = concat!(
            "HAI 1.2\n",
            "HOW IZ I FACT YR N\n",
            "BOTH SAEM N AN 0\n",
            "O RLY?\n",
            "YA RLY\n",
            "FOUND YR 1\n",
            "NO WAI\n",
            "FOUND YR PRODUKT OF N AN I IZ FACT YR DIFF OF N AN 1 MKAY\n",
            "OIC\n",
            "IF U SAY SO\n",
            "I HAS A R ITZ I IZ FACT YR 5 MKAY\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "R"), Value::Int(120));
    }

    #[test]
    fn loop_update_can_call_a_unary_function() {
        let src = concat!(
            "HAI 1.2\n",
            "HOW IZ I DOUBLE YR N\n",
            "FOUND YR PRODUKT OF N AN 2\n",
            "IF U SAY SO\n",
            "I HAS A I ITZ 1\n",
            "IM IN YR LOOP I IZ DOUBLE YR I MKAY TIL BOTH SAEM I AN 8\n",
            "IM OUTTA YR LOOP\n",
            "KTHXBYE\n",
        );
        assert_eq!(run_and_read(src, "I"), Value::Int(8));
    }

    #[test]
    fn alt_array_def_is_instantiated_by_replaying_its_body() {
        let src = concat!(
            "HAI 1.2\n",
            "OH HAI IM PERSON\n",
            "I HAS A NAME ITZ \"BOB\"\n",
            "KTHX\n",
            "I HAS A P ITZ A BUKKIT LIEK PERSON\n",
            "KTHXBYE\n",
        );
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new(src, file).lex().unwrap();
        let tokens = Tokenizer::new(lexemes).tokenize().unwrap();
        let program = parser::parse(tokens).unwrap();
        // `P` should own a `NAME` slot seeded by the template's body.
        let root = Scope::root();
        Interpreter::new(false).execute_block(&program.body, &root).unwrap();
        match Scope::get(&root, "P").unwrap() {
            Value::Bukkit(b) => assert_eq!(b.borrow().get("NAME"), Some(Value::Str("BOB".to_owned()))),
            other => panic!("expected a BUKKIT, got {other:?}"),
        }
    }

    #[test]
    fn bound_native_function_is_callable_like_a_defined_one() {
        // `Binding` has no surface syntax — the parser never produces one
        // — so this builds the AST directly, as an embedder wiring in a
        // native collaborator would.
        let file: Rc<str> = Rc::from("test.ohai");
        let body = Block(vec![
            Statement::Binding { name: "DOUBLE".to_owned(), arity: 1, file: file.clone(), line: 1 },
            Statement::Declare {
                scope: Identifier::direct("I", file.clone(), 2),
                target: "X".to_owned(),
                init: Some(DeclareInit::Value(Expression::FunctionCall {
                    caller: Box::new(Identifier::direct("I", file.clone(), 2)),
                    name: "DOUBLE".to_owned(),
                    args: vec![Expression::Constant(crate::ast::Constant {
                        value: Literal::Int(21),
                        file: file.clone(),
                        line: 2,
                    })],
                    file: file.clone(),
                    line: 2,
                })),
                file: file.clone(),
                line: 2,
            },
        ]);
        let root = Scope::root();
        let mut interp = Interpreter::new(false);
        interp.bind_native("DOUBLE", |args| match args {
            [Value::Int(n)] => Ok(Value::Int(n * 2)),
            _ => unreachable!("arity is checked before the native runs"),
        });
        interp.execute_block(&body, &root).unwrap();
        assert_eq!(Scope::get(&root, "X"), Some(Value::Int(42)));
    }
}
