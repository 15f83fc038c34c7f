// ABOUTME: Type predicate builtins — is_num, is_str, is_list, is_fun

use crate::context::Context;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::position::Position;
use crate::value::{Value, ValueKind};
use std::rc::Rc;

fn is_num(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    Ok(Value::number(matches!(args[0].kind, ValueKind::Number(_)) as u8 as f64))
}

fn is_str(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    Ok(Value::number(matches!(args[0].kind, ValueKind::String(_)) as u8 as f64))
}

fn is_list(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    Ok(Value::number(matches!(args[0].kind, ValueKind::List(_)) as u8 as f64))
}

fn is_fun(args: &[Value], _context: &Rc<Context>, _start: &Position, _end: &Position) -> Result<Value, RuntimeError> {
    Ok(Value::number(
        matches!(args[0].kind, ValueKind::Function { .. } | ValueKind::BuiltinFunction { .. }) as u8 as f64,
    ))
}

pub fn register(env: &Rc<Environment>) {
    env.set("is_num", Value::builtin("is_num", vec!["value".to_string()], is_num));
    env.set("is_str", Value::builtin("is_str", vec!["value".to_string()], is_str));
    env.set("is_list", Value::builtin("is_list", vec!["value".to_string()], is_list));
    env.set("is_fun", Value::builtin("is_fun", vec!["value".to_string()], is_fun));
}
