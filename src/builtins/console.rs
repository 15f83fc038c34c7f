// ABOUTME: print/print_ret builtins — the entirety of the standard I/O surface

use crate::context::Context;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::position::Position;
use crate::value::Value;
use std::rc::Rc;

fn print(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    println!("{}", args[0]);
    Ok(Value::number(0.0))
}

/// Prints like `print`, but returns the printed String instead of
/// `Number(0)` so a caller can chain further string operations on it.
fn print_ret(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    let rendered = args[0].to_string();
    println!("{rendered}");
    Ok(Value::string(rendered))
}

pub fn register(env: &Rc<Environment>) {
    env.set("print", Value::builtin("print", vec!["value".to_string()], print));
    env.set("print_ret", Value::builtin("print_ret", vec!["value".to_string()], print_ret));
}
