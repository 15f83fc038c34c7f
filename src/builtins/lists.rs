// ABOUTME: List builtins — len, append, pop, extend

use crate::context::Context;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::position::Position;
use crate::value::{Value, ValueKind};
use std::rc::Rc;

fn custom_error(message: impl Into<String>, context: &Rc<Context>, start: &Position, end: &Position) -> RuntimeError {
    RuntimeError::Custom {
        message: message.into(),
        start: start.clone(),
        end: end.clone(),
        context: context.clone(),
    }
}

fn len(args: &[Value], context: &Rc<Context>, start: &Position, end: &Position) -> Result<Value, RuntimeError> {
    match &args[0].kind {
        ValueKind::List(items) => Ok(Value::number(items.borrow().len() as f64)),
        ValueKind::String(s) => Ok(Value::number(s.chars().count() as f64)),
        _ => Err(custom_error(
            format!("len expects a List or String, got {}", args[0].type_name()),
            context,
            start,
            end,
        )),
    }
}

fn append(args: &[Value], context: &Rc<Context>, start: &Position, end: &Position) -> Result<Value, RuntimeError> {
    match &args[0].kind {
        ValueKind::List(items) => {
            items.borrow_mut().push(args[1].copy());
            Ok(args[0].copy())
        }
        _ => Err(custom_error(
            format!("append expects a List, got {}", args[0].type_name()),
            context,
            start,
            end,
        )),
    }
}

fn pop(args: &[Value], context: &Rc<Context>, start: &Position, end: &Position) -> Result<Value, RuntimeError> {
    let items = match &args[0].kind {
        ValueKind::List(items) => items,
        _ => {
            return Err(custom_error(
                format!("pop expects a List, got {}", args[0].type_name()),
                context,
                start,
                end,
            ))
        }
    };
    let index = args[1].as_number().ok_or_else(|| {
        custom_error(format!("pop expects a Number index, got {}", args[1].type_name()), context, start, end)
    })?;
    let mut items = items.borrow_mut();
    let idx = index as isize;
    if idx < 0 || idx as usize >= items.len() {
        return Err(RuntimeError::IndexOutOfBounds {
            start: start.clone(),
            end: end.clone(),
            context: context.clone(),
        });
    }
    Ok(items.remove(idx as usize))
}

fn extend(args: &[Value], context: &Rc<Context>, start: &Position, end: &Position) -> Result<Value, RuntimeError> {
    let items = match &args[0].kind {
        ValueKind::List(items) => items,
        _ => {
            return Err(custom_error(
                format!("extend expects a List, got {}", args[0].type_name()),
                context,
                start,
                end,
            ))
        }
    };
    let other = match &args[1].kind {
        ValueKind::List(other) => other,
        _ => {
            return Err(custom_error(
                format!("extend expects a List, got {}", args[1].type_name()),
                context,
                start,
                end,
            ))
        }
    };
    let extra: Vec<Value> = other.borrow().iter().map(Value::copy).collect();
    items.borrow_mut().extend(extra);
    Ok(args[0].copy())
}

pub fn register(env: &Rc<Environment>) {
    env.set("len", Value::builtin("len", vec!["value".to_string()], len));
    env.set("append", Value::builtin("append", vec!["list".to_string(), "value".to_string()], append));
    env.set("pop", Value::builtin("pop", vec!["list".to_string(), "index".to_string()], pop));
    env.set("extend", Value::builtin("extend", vec!["list".to_string(), "other".to_string()], extend));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Rc<Context> {
        Context::top_level(Environment::new())
    }

    #[test]
    fn len_counts_list_elements_and_string_codepoints() {
        let p = Position::unknown();
        let list = Value::list(vec![Value::number(1.0), Value::number(2.0)]);
        assert_eq!(len(&[list], &ctx(), &p, &p).unwrap().as_number(), Some(2.0));
        assert_eq!(len(&[Value::string("hi")], &ctx(), &p, &p).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn append_mutates_in_place() {
        let p = Position::unknown();
        let list = Value::list(vec![Value::number(1.0)]);
        let result = append(&[list.clone(), Value::number(2.0)], &ctx(), &p, &p).unwrap();
        assert_eq!(result.to_string(), "[1, 2]");
        assert_eq!(list.to_string(), "[1, 2]");
    }

    #[test]
    fn pop_removes_and_returns_element() {
        let p = Position::unknown();
        let list = Value::list(vec![Value::number(1.0), Value::number(2.0)]);
        let removed = pop(&[list.clone(), Value::number(0.0)], &ctx(), &p, &p).unwrap();
        assert_eq!(removed.as_number(), Some(1.0));
        assert_eq!(list.to_string(), "[2]");
    }

    #[test]
    fn pop_out_of_range_is_index_error() {
        let p = Position::unknown();
        let list = Value::list(vec![Value::number(1.0)]);
        let err = pop(&[list, Value::number(5.0)], &ctx(), &p, &p);
        assert!(matches!(err, Err(RuntimeError::IndexOutOfBounds { .. })));
    }

    #[test]
    fn extend_appends_all_elements() {
        let p = Position::unknown();
        let list = Value::list(vec![Value::number(1.0)]);
        let other = Value::list(vec![Value::number(2.0), Value::number(3.0)]);
        let result = extend(&[list.clone(), other], &ctx(), &p, &p).unwrap();
        assert_eq!(result.to_string(), "[1, 2, 3]");
    }
}
