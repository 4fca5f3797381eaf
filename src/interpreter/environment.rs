use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use super::errors::RuntimeErrorKind;
use super::object::Value;

/// One frame in the name-resolution chain. Cloning is shallow; every clone
/// shares the same bindings. Closures keep their defining scope alive, so a
/// recursive binding forms an `Rc` cycle that is never collected.
#[derive(Debug, Clone)]
pub struct Environment {
    env_ptr: Rc<RefCell<EnvironmentData>>,
}

#[derive(Debug)]
struct EnvironmentData {
    bindings: HashMap<String, Value>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        let env_data = EnvironmentData {
            bindings: HashMap::new(),
            parent: None,
        };
        Environment {
            env_ptr: Rc::new(RefCell::new(env_data)),
        }
    }

    /// Returns a fresh empty scope whose parent is the receiver.
    pub fn child(&self) -> Self {
        let env_data = EnvironmentData {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        };
        Environment {
            env_ptr: Rc::new(RefCell::new(env_data)),
        }
    }

    /// Looks a name up, walking outward to the nearest scope that defines it.
    pub fn resolve(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        let env_data = self.env_ptr.borrow();

        match env_data.bindings.get(name) {
            Some(value) => Ok(value.clone()),
            None => match &env_data.parent {
                Some(parent) => parent.resolve(name),
                None => Err(RuntimeErrorKind::NotDefined(name.to_owned())),
            },
        }
    }

    /// Installs a binding in this scope. Shadowing an outer binding is fine;
    /// redeclaring in the same scope is not.
    pub fn create(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        match self.env_ptr.borrow_mut().bindings.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(RuntimeErrorKind::AlreadyDefined(name.to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Overwrites the nearest binding of the name. Never creates one.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        let mut env_data = self.env_ptr.borrow_mut();

        if let Some(slot) = env_data.bindings.get_mut(name) {
            *slot = value;
            return Ok(());
        }

        match &env_data.parent {
            Some(parent) => parent.set(name, value),
            None => Err(RuntimeErrorKind::SetUndefined(name.to_owned())),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let env = Environment::new();

        env.create("x", Value::Int(5)).unwrap();
        assert_eq!(env.resolve("x"), Ok(Value::Int(5)));

        assert_eq!(
            env.resolve("y"),
            Err(RuntimeErrorKind::NotDefined("y".to_owned()))
        );
    }

    #[test]
    fn test_create_rejects_same_scope_duplicates() {
        let env = Environment::new();

        env.create("x", Value::Int(5)).unwrap();
        assert_eq!(
            env.create("x", Value::Int(6)),
            Err(RuntimeErrorKind::AlreadyDefined("x".to_owned()))
        );
        assert_eq!(env.resolve("x"), Ok(Value::Int(5)));
    }

    #[test]
    fn test_shadowing_in_child_scope() {
        let env = Environment::new();
        env.create("x", Value::Int(1)).unwrap();

        let child = env.child();
        child.create("x", Value::Int(2)).unwrap();

        assert_eq!(child.resolve("x"), Ok(Value::Int(2)));
        assert_eq!(env.resolve("x"), Ok(Value::Int(1)));
    }

    #[test]
    fn test_set_walks_outward() {
        let env = Environment::new();
        env.create("x", Value::Int(1)).unwrap();

        let child = env.child();
        child.set("x", Value::Int(7)).unwrap();

        assert_eq!(env.resolve("x"), Ok(Value::Int(7)));
        assert_eq!(child.resolve("x"), Ok(Value::Int(7)));
    }

    #[test]
    fn test_set_does_not_create() {
        let env = Environment::new();
        let child = env.child();

        assert_eq!(
            child.set("x", Value::Int(1)),
            Err(RuntimeErrorKind::SetUndefined("x".to_owned()))
        );
        assert_eq!(
            env.resolve("x"),
            Err(RuntimeErrorKind::NotDefined("x".to_owned()))
        );
    }

    #[test]
    fn test_resolve_walks_multiple_levels() {
        let env = Environment::new();
        env.create("x", Value::Int(1)).unwrap();

        let grandchild = env.child().child();
        assert_eq!(grandchild.resolve("x"), Ok(Value::Int(1)));
    }
}
