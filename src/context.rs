// ABOUTME: Execution context (call-frame) used for closures and error tracebacks

use crate::env::Environment;
use crate::position::Position;
use std::rc::Rc;

/// A call-frame record. Contexts form a stack via `parent`; they are created
/// on function entry and at the top-level `run`, and are never mutated after
/// construction (spec invariant).
#[derive(Debug)]
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    pub parent_entry_pos: Option<Position>,
    pub env: Rc<Environment>,
}

impl Context {
    pub fn new(
        display_name: String,
        parent: Option<Rc<Context>>,
        parent_entry_pos: Option<Position>,
        env: Rc<Environment>,
    ) -> Self {
        Context {
            display_name,
            parent,
            parent_entry_pos,
            env,
        }
    }

    /// Top-level context for a fresh program run.
    pub fn top_level(env: Rc<Environment>) -> Rc<Self> {
        Rc::new(Context::new("<program>".to_string(), None, None, env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_has_no_parent() {
        let ctx = Context::top_level(Environment::new());
        assert!(ctx.parent.is_none());
        assert_eq!(ctx.display_name, "<program>");
    }

    #[test]
    fn child_context_links_to_parent() {
        let root = Context::top_level(Environment::new());
        let child_env = Environment::with_parent(root.env.clone());
        let child = Rc::new(Context::new(
            "add".to_string(),
            Some(root.clone()),
            None,
            child_env,
        ));
        assert_eq!(child.parent.as_ref().unwrap().display_name, "<program>");
    }
}
