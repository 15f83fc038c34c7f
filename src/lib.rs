// ABOUTME: Library surface exposing the lexer/parser/evaluator pipeline for testing and reuse

pub mod ast;
pub mod builtins;
pub mod config;
pub mod context;
pub mod control;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod token;
pub mod value;

use std::rc::Rc;

/// Builds a fresh global environment seeded with constants and built-ins,
/// and the top-level context that runs against it.
pub fn fresh_top_level() -> Rc<context::Context> {
    let env = env::Environment::new();
    builtins::register_builtins(&env);
    context::Context::top_level(env)
}

/// Lexes, parses, and evaluates `source` in a brand new top-level
/// environment. Convenience entry point for scripts and tests that don't
/// need to share state across multiple calls.
pub fn run_source(
    file_name: impl Into<Rc<str>>,
    source: impl Into<Rc<str>>,
) -> Result<value::Value, Box<dyn error::Diagnostic>> {
    let file_name = file_name.into();
    let source = source.into();
    let tokens = lexer::tokenize(file_name, source).map_err(|e| Box::new(e) as Box<dyn error::Diagnostic>)?;
    let ast = parser::parse(tokens).map_err(|e| Box::new(e) as Box<dyn error::Diagnostic>)?;
    let context = fresh_top_level();
    eval::run(&ast, &context).map_err(|e| Box::new(e) as Box<dyn error::Diagnostic>)
}
