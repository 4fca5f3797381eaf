use std::fmt;
use std::rc::Rc;

use crate::frontend::grammar::{Block, FunctionDecl};

use super::builtins::NativeFn;
use super::environment::Environment;

pub struct ClosureData {
    decl: Rc<FunctionDecl>,
    env: Environment,
}

/// A user function: parameter names, body, and the scope captured at the
/// definition site.
#[derive(Clone)]
pub struct Closure(Rc<ClosureData>);

impl Closure {
    pub fn new(decl: Rc<FunctionDecl>, env: Environment) -> Self {
        Closure(Rc::new(ClosureData { decl, env }))
    }

    pub fn params(&self) -> &[String] {
        &self.0.decl.params
    }

    pub fn body(&self) -> &Block {
        &self.0.decl.body
    }

    pub fn env(&self) -> &Environment {
        &self.0.env
    }

    pub fn arity(&self) -> usize {
        self.0.decl.params.len()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fn({})", self.params().join(", "))
    }
}

impl PartialEq<Closure> for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Closure {}

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Closure(Closure),
    Native(NativeFn),
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Closure(closure) => write!(f, "fn({})", closure.params().join(", ")),
            Function::Native(native) => write!(f, "<native fn {}>", native.name()),
        }
    }
}
