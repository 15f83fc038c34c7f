// ABOUTME: Tree-walking evaluator: dispatches on AST node variant to produce a RuntimeResult

use crate::ast::{BinOpKind, Node, UnaryOpKind};
use crate::context::Context;
use crate::control::RuntimeResult;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::position::Position;
use crate::value::{BuiltinFn, Value};
use std::rc::Rc;

/// Evaluates `node` in `context`, dispatching by variant. Every branch
/// returns a `RuntimeResult`; callers test `should_return()` after every
/// child evaluation and propagate unchanged, except loop bodies which
/// intercept break/continue themselves.
pub fn eval(node: &Node, context: &Rc<Context>) -> RuntimeResult {
    match node {
        Node::Number { value, start, end } => RuntimeResult::new().success(
            Value::number(*value)
                .with_position(start.clone(), end.clone())
                .with_context(context.clone()),
        ),
        Node::Str { value, start, end } => RuntimeResult::new().success(
            Value::string(value.clone())
                .with_position(start.clone(), end.clone())
                .with_context(context.clone()),
        ),
        Node::ListLit { elements, start, end } => eval_list(elements, start, end, context),
        Node::BinOp { left, op, right, start, end } => eval_bin_op(left, *op, right, start, end, context),
        Node::UnaryOp { op, operand, start, end } => eval_unary_op(*op, operand, start, end, context),
        Node::VarAccess { name, start, end } => eval_var_access(name, start, end, context),
        Node::VarAssign { name, value, start, end } => eval_var_assign(name, value, start, end, context),
        Node::If { cases, else_case, .. } => eval_if(cases, else_case, context),
        Node::For {
            var_name,
            start_value,
            end_value,
            step_value,
            body,
            should_return_null,
            ..
        } => eval_for(var_name, start_value, end_value, step_value.as_deref(), body, *should_return_null, context),
        Node::While { condition, body, should_return_null, .. } => {
            eval_while(condition, body, *should_return_null, context)
        }
        Node::FuncDef { name, params, body, auto_return, start, end } => {
            eval_func_def(name.clone(), params, body, *auto_return, start, end, context)
        }
        Node::Call { callee, args, start, end } => eval_call(callee, args, start, end, context),
        Node::Return { value, start, end } => eval_return(value.as_deref(), start, end, context),
        Node::Continue { .. } => RuntimeResult::new().success_continue(),
        Node::Break { .. } => RuntimeResult::new().success_break(),
    }
}

fn eval_list(elements: &[Node], start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match result.register(eval(element, context)) {
            Some(value) => values.push(value),
            None => return result,
        }
        if result.should_return() {
            return result;
        }
    }
    result.success(Value::list(values).with_position(start.clone(), end.clone()).with_context(context.clone()))
}

fn eval_bin_op(
    left: &Node,
    op: BinOpKind,
    right: &Node,
    start: &Position,
    end: &Position,
    context: &Rc<Context>,
) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let left_value = match result.register(eval(left, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }

    let right_value = match result.register(eval(right, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }

    let outcome = match op {
        BinOpKind::Plus => left_value.add_to(&right_value),
        BinOpKind::Minus => left_value.subtract_by(&right_value),
        BinOpKind::Mul => left_value.multiply_by(&right_value),
        BinOpKind::Div => left_value.divide_by(&right_value),
        BinOpKind::Power => left_value.power_by(&right_value),
        BinOpKind::Modulo => left_value.modulo_by(&right_value),
        BinOpKind::CleanDiv => left_value.clean_divide_by(&right_value),
        BinOpKind::Ee => left_value.get_comparison_ee(&right_value),
        BinOpKind::Ne => left_value.get_comparison_ne(&right_value),
        BinOpKind::Lt => left_value.get_comparison_lt(&right_value),
        BinOpKind::Lte => left_value.get_comparison_lte(&right_value),
        BinOpKind::Gt => left_value.get_comparison_gt(&right_value),
        BinOpKind::Gte => left_value.get_comparison_gte(&right_value),
        BinOpKind::And => left_value.anded_by(&right_value),
        BinOpKind::Or => left_value.ored_by(&right_value),
    };

    match outcome {
        Ok(value) => result.success(value.with_position(start.clone(), end.clone()).with_context(context.clone())),
        Err(error) => result.failure(error),
    }
}

fn eval_unary_op(op: UnaryOpKind, operand: &Node, start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let value = match result.register(eval(operand, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }

    let outcome = match op {
        UnaryOpKind::Minus => value.negate(),
        UnaryOpKind::Not => value.notted(),
    };

    match outcome {
        Ok(value) => result.success(value.with_position(start.clone(), end.clone()).with_context(context.clone())),
        Err(error) => result.failure(error),
    }
}

fn eval_var_access(name: &str, start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    match context.env.get(name) {
        Some(value) => RuntimeResult::new().success(
            value.copy().with_position(start.clone(), end.clone()).with_context(context.clone()),
        ),
        None => RuntimeResult::new().failure(RuntimeError::UndefinedSymbol {
            name: name.to_string(),
            start: start.clone(),
            end: end.clone(),
            context: context.clone(),
        }),
    }
}

fn eval_var_assign(name: &str, value_node: &Node, start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let value = match result.register(eval(value_node, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }
    context.env.set(name, value.clone());
    result.success(value.with_position(start.clone(), end.clone()).with_context(context.clone()))
}

fn eval_if(
    cases: &[(Node, Node, bool)],
    else_case: &Option<(Box<Node>, bool)>,
    context: &Rc<Context>,
) -> RuntimeResult {
    let mut result = RuntimeResult::new();

    for (condition, expr, should_return_null) in cases {
        let condition_value = match result.register(eval(condition, context)) {
            Some(v) => v,
            None => return result,
        };
        if result.should_return() {
            return result;
        }

        if condition_value.is_true() {
            let value = match result.register(eval(expr, context)) {
                Some(v) => v,
                None => return result,
            };
            if result.should_return() {
                return result;
            }
            return result.success(if *should_return_null { Value::number(0.0) } else { value });
        }
    }

    if let Some((expr, should_return_null)) = else_case {
        let value = match result.register(eval(expr, context)) {
            Some(v) => v,
            None => return result,
        };
        if result.should_return() {
            return result;
        }
        return result.success(if *should_return_null { Value::number(0.0) } else { value });
    }

    result.success(Value::number(0.0))
}

fn eval_for(
    var_name: &str,
    start_node: &Node,
    end_node: &Node,
    step_node: Option<&Node>,
    body: &Node,
    should_return_null: bool,
    context: &Rc<Context>,
) -> RuntimeResult {
    let mut result = RuntimeResult::new();

    let start_value = match result.register(eval(start_node, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }
    let end_value = match result.register(eval(end_node, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }
    let step_value = match step_node {
        Some(node) => match result.register(eval(node, context)) {
            Some(v) => v,
            None => return result,
        },
        None => Value::number(1.0),
    };
    if result.should_return() {
        return result;
    }

    let mut index = start_value.as_number().unwrap_or(0.0);
    let end = end_value.as_number().unwrap_or(0.0);
    let step = step_value.as_number().unwrap_or(1.0);
    let condition = |index: f64| if step >= 0.0 { index < end } else { index > end };

    let mut values = Vec::new();
    while condition(index) {
        context.env.set(var_name, Value::number(index));
        index += step;

        let body_result = eval(body, context);
        if body_result.loop_should_continue {
            continue;
        }
        if body_result.loop_should_break {
            break;
        }
        match result.register(body_result) {
            Some(value) => values.push(value),
            None => return result,
        }
        if result.should_return() {
            return result;
        }
    }

    result.success(if should_return_null {
        Value::number(0.0)
    } else {
        Value::list(values)
    })
}

fn eval_while(condition: &Node, body: &Node, should_return_null: bool, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let mut values = Vec::new();

    loop {
        let condition_value = match result.register(eval(condition, context)) {
            Some(v) => v,
            None => return result,
        };
        if result.should_return() {
            return result;
        }
        if !condition_value.is_true() {
            break;
        }

        let body_result = eval(body, context);
        if body_result.loop_should_continue {
            continue;
        }
        if body_result.loop_should_break {
            break;
        }
        match result.register(body_result) {
            Some(value) => values.push(value),
            None => return result,
        }
        if result.should_return() {
            return result;
        }
    }

    result.success(if should_return_null {
        Value::number(0.0)
    } else {
        Value::list(values)
    })
}

fn eval_func_def(
    name: Option<String>,
    params: &[String],
    body: &Node,
    auto_return: bool,
    start: &Position,
    end: &Position,
    context: &Rc<Context>,
) -> RuntimeResult {
    let function = Value::function(
        name.clone(),
        Rc::new(body.clone()),
        params.to_vec(),
        auto_return,
        context.clone(),
    )
    .with_position(start.clone(), end.clone())
    .with_context(context.clone());

    if let Some(name) = &name {
        context.env.set(name, function.clone());
    }

    RuntimeResult::new().success(function)
}

fn eval_call(callee: &Node, arg_nodes: &[Node], start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();

    let callee_value = match result.register(eval(callee, context)) {
        Some(v) => v,
        None => return result,
    };
    if result.should_return() {
        return result;
    }
    let callee_value = callee_value.copy().with_position(start.clone(), end.clone());

    let mut args = Vec::with_capacity(arg_nodes.len());
    for arg_node in arg_nodes {
        let arg_value = match result.register(eval(arg_node, context)) {
            Some(v) => v,
            None => return result,
        };
        if result.should_return() {
            return result;
        }
        args.push(arg_value);
    }

    let call_result = callee_value.execute(args, start.clone(), end.clone(), context);
    match result.register(call_result) {
        Some(value) => result.success(value.copy().with_position(start.clone(), end.clone()).with_context(context.clone())),
        None => result,
    }
}

fn eval_return(value_node: Option<&Node>, start: &Position, end: &Position, context: &Rc<Context>) -> RuntimeResult {
    let mut result = RuntimeResult::new();
    let value = match value_node {
        Some(node) => match result.register(eval(node, context)) {
            Some(v) => v,
            None => return result,
        },
        None => Value::number(0.0).with_position(start.clone(), end.clone()).with_context(context.clone()),
    };
    if result.should_return() {
        return result;
    }
    result.success_return(value)
}

/// Invokes a user-defined function: arity check, fresh call context/env,
/// parameter binding, body evaluation, return-value extraction.
pub fn call_user_function(
    name: Option<&str>,
    body: &Node,
    params: &[String],
    auto_return: bool,
    captured_context: &Rc<Context>,
    args: Vec<Value>,
    call_start: Position,
    call_end: Position,
) -> RuntimeResult {
    if args.len() != params.len() {
        return RuntimeResult::new().failure(RuntimeError::ArityMismatch {
            function: name.unwrap_or("<anonymous>").to_string(),
            expected: params.len(),
            actual: args.len(),
            start: call_start,
            end: call_end,
            context: captured_context.clone(),
        });
    }

    let call_env = Environment::with_parent(captured_context.env.clone());
    let call_context = Rc::new(Context::new(
        name.map(str::to_string).unwrap_or_else(|| "<anonymous>".to_string()),
        Some(captured_context.clone()),
        Some(call_start.clone()),
        call_env.clone(),
    ));

    for (param, arg) in params.iter().zip(args.into_iter()) {
        call_env.set(param, arg.with_context(call_context.clone()));
    }

    let body_result = eval(body, &call_context);

    // A bare BREAK/CONTINUE that escapes all the way out of a function body
    // without being caught by an enclosing loop is a program error, not a
    // signal the caller should keep propagating.
    if body_result.loop_should_break || body_result.loop_should_continue {
        let keyword = if body_result.loop_should_break { "BREAK" } else { "CONTINUE" };
        return RuntimeResult::new().failure(RuntimeError::LoopControlOutsideLoop {
            keyword,
            start: call_start,
            end: call_end,
            context: call_context,
        });
    }

    if let Some(error) = body_result.error {
        return RuntimeResult::new().failure(error);
    }

    let return_value = body_result
        .return_value
        .or_else(|| if auto_return { body_result.value } else { None })
        .unwrap_or_else(|| Value::number(0.0));

    RuntimeResult::new().success(return_value)
}

/// Invokes a built-in function: identical arity/binding protocol, but
/// dispatches straight into host code instead of an AST body.
pub fn call_builtin_function(
    name: &'static str,
    params: &[String],
    func: BuiltinFn,
    context: Rc<Context>,
    args: Vec<Value>,
    call_start: Position,
    call_end: Position,
) -> RuntimeResult {
    if args.len() != params.len() {
        return RuntimeResult::new().failure(RuntimeError::ArityMismatch {
            function: name.to_string(),
            expected: params.len(),
            actual: args.len(),
            start: call_start,
            end: call_end,
            context,
        });
    }

    match func(&args, &context, &call_start, &call_end) {
        Ok(value) => RuntimeResult::new().success(value),
        Err(error) => RuntimeResult::new().failure(error),
    }
}

/// Top-level driver: evaluates a whole program in a fresh top-level
/// context, turning any unconsumed break/continue signal into a runtime
/// error (break/continue outside a loop is a program bug, not something
/// to silently ignore).
pub fn run(node: &Node, context: &Rc<Context>) -> Result<Value, RuntimeError> {
    let result = eval(node, context);

    if result.loop_should_break || result.loop_should_continue {
        let (start, end) = node.span();
        let keyword = if result.loop_should_break { "BREAK" } else { "CONTINUE" };
        return Err(RuntimeError::LoopControlOutsideLoop {
            keyword,
            start: start.clone(),
            end: end.clone(),
            context: context.clone(),
        });
    }

    if let Some(error) = result.error {
        return Err(error);
    }

    Ok(result.return_value.or(result.value).unwrap_or_else(|| Value::number(0.0)))
}
