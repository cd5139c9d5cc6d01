use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Block;
use crate::error::SourceResult;

use super::Value;

/// A Rust closure bound into the function table by a `Binding`
/// statement, callable from OHAI source exactly like a `HOW IZ`
/// definition. See [`super::Interpreter::bind_native`].
pub type NativeFn = Rc<dyn Fn(&[Value]) -> SourceResult<Value>>;

/// A callable entry in a scope's function table: either an OHAI function
/// defined with `HOW IZ` (params, body, and the scope it closed over —
/// lexical, not dynamic, scoping) or a native one installed by the
/// embedder via a `Binding` statement.
pub enum Function {
    Defined {
        params: Vec<String>,
        body: Block,
        closure: Rc<RefCell<Scope>>,
    },
    Native {
        arity: usize,
        implementation: NativeFn,
    },
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Defined { params, .. } => {
                f.debug_struct("Function::Defined").field("params", params).finish()
            }
            Function::Native { arity, .. } => {
                f.debug_struct("Function::Native").field("arity", arity).finish()
            }
        }
    }
}

/// A `BUKKIT` template registered by `OH HAI IM`: the body is replayed
/// against a fresh `BUKKIT` value each time one is constructed from it.
#[derive(Debug)]
pub struct ArrayTemplate {
    pub parent: Option<String>,
    pub body: Block,
    pub closure: Rc<RefCell<Scope>>,
}

#[derive(Debug)]
pub struct Scope {
    vars: HashMap<String, Value>,
    functions: HashMap<String, Rc<Function>>,
    array_templates: HashMap<String, Rc<ArrayTemplate>>,
    pub it: Value,
    parent: Option<Rc<RefCell<Scope>>>,
}

impl Scope {
    pub fn root() -> Rc<RefCell<Scope>> {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            functions: HashMap::new(),
            array_templates: HashMap::new(),
            it: Value::Noob,
            parent: None,
        }))
    }

    pub fn child(parent: &Rc<RefCell<Scope>>) -> Rc<RefCell<Scope>> {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            functions: HashMap::new(),
            array_templates: HashMap::new(),
            it: Value::Noob,
            parent: Some(parent.clone()),
        }))
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The variables declared directly in this scope (not its parents).
    /// Used to harvest an array template's body into the `BUKKIT` it was
    /// replayed to build.
    pub fn own_vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }

    /// Looks a name up along the scope chain.
    pub fn get(this: &Rc<RefCell<Scope>>, name: &str) -> Option<Value> {
        let scope = this.borrow();
        if let Some(v) = scope.vars.get(name) {
            return Some(v.clone());
        }
        match &scope.parent {
            Some(parent) => Scope::get(parent, name),
            None => None,
        }
    }

    /// Walks the chain to find the scope owning `name` and overwrites its
    /// value there; returns `false` if `name` is undeclared anywhere.
    pub fn set(this: &Rc<RefCell<Scope>>, name: &str, value: Value) -> bool {
        if this.borrow().vars.contains_key(name) {
            this.borrow_mut().vars.insert(name.to_owned(), value);
            return true;
        }
        let parent = this.borrow().parent.clone();
        match parent {
            Some(parent) => Scope::set(&parent, name, value),
            None => false,
        }
    }

    pub fn register_function(&mut self, name: impl Into<String>, func: Rc<Function>) {
        self.functions.insert(name.into(), func);
    }

    pub fn lookup_function(this: &Rc<RefCell<Scope>>, name: &str) -> Option<Rc<Function>> {
        let scope = this.borrow();
        if let Some(f) = scope.functions.get(name) {
            return Some(f.clone());
        }
        match &scope.parent {
            Some(parent) => Scope::lookup_function(parent, name),
            None => None,
        }
    }

    pub fn register_array_template(&mut self, name: impl Into<String>, tpl: Rc<ArrayTemplate>) {
        self.array_templates.insert(name.into(), tpl);
    }

    pub fn lookup_array_template(this: &Rc<RefCell<Scope>>, name: &str) -> Option<Rc<ArrayTemplate>> {
        let scope = this.borrow();
        if let Some(t) = scope.array_templates.get(name) {
            return Some(t.clone());
        }
        match &scope.parent {
            Some(parent) => Scope::lookup_array_template(parent, name),
            None => None,
        }
    }
}
