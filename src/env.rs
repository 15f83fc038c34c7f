// ABOUTME: Environment module for managing variable bindings and lexical scopes

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment, pre-populated with NULL/TRUE/FALSE.
    pub fn new() -> Rc<Self> {
        let env = Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        };
        env.seed_constants();
        Rc::new(env)
    }

    /// Creates a new child environment with a parent, also pre-populated
    /// with NULL/TRUE/FALSE per spec (every freshly created environment
    /// carries these, not just the global one).
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        let env = Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        };
        env.seed_constants();
        Rc::new(env)
    }

    fn seed_constants(&self) {
        let mut bindings = self.bindings.borrow_mut();
        bindings.insert("NULL".to_string(), Value::number(0.0));
        bindings.insert("TRUE".to_string(), Value::number(1.0));
        bindings.insert("FALSE".to_string(), Value::number(0.0));
    }

    /// Looks up a symbol in this scope, then parent scopes. Never mutates.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Writes a binding into THIS scope only (spec: assignment always
    /// writes to the local scope, never mutating parent scopes).
    pub fn set(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Deletes a binding from this scope only.
    pub fn remove(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_environment_seeds_constants() {
        let env = Environment::new();
        assert_eq!(env.get("NULL").unwrap().as_number(), Some(0.0));
        assert_eq!(env.get("TRUE").unwrap().as_number(), Some(1.0));
        assert_eq!(env.get("FALSE").unwrap().as_number(), Some(0.0));
    }

    #[test]
    fn set_and_get() {
        let env = Environment::new();
        env.set("x", Value::number(42.0));
        assert_eq!(env.get("x").unwrap().as_number(), Some(42.0));
    }

    #[test]
    fn missing_symbol_returns_none() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Environment::new();
        parent.set("x", Value::number(42.0));

        let child = Environment::with_parent(parent);
        assert_eq!(child.get("x").unwrap().as_number(), Some(42.0));
    }

    #[test]
    fn assignment_in_child_does_not_mutate_parent() {
        let parent = Environment::new();
        parent.set("x", Value::number(42.0));

        let child = Environment::with_parent(parent.clone());
        child.set("x", Value::number(100.0));

        assert_eq!(child.get("x").unwrap().as_number(), Some(100.0));
        assert_eq!(parent.get("x").unwrap().as_number(), Some(42.0));
    }

    #[test]
    fn remove_deletes_local_binding_only() {
        let parent = Environment::new();
        parent.set("x", Value::number(1.0));
        let child = Environment::with_parent(parent.clone());
        child.set("x", Value::number(2.0));

        child.remove("x");
        // Falls through to parent's binding now that the local one is gone.
        assert_eq!(child.get("x").unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn multiple_levels_of_nesting() {
        let grandparent = Environment::new();
        grandparent.set("a", Value::number(1.0));

        let parent = Environment::with_parent(grandparent);
        parent.set("b", Value::number(2.0));

        let child = Environment::with_parent(parent);
        child.set("c", Value::number(3.0));

        assert_eq!(child.get("a").unwrap().as_number(), Some(1.0));
        assert_eq!(child.get("b").unwrap().as_number(), Some(2.0));
        assert_eq!(child.get("c").unwrap().as_number(), Some(3.0));
    }
}
