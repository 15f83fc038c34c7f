// ABOUTME: Runtime value types and the operations the evaluator dispatches binary/unary ops onto

use crate::ast::Node;
use crate::context::Context;
use crate::control::RuntimeResult;
use crate::error::RuntimeError;
use crate::position::Position;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A built-in function body. Receives the already-arity-checked argument
/// values plus the call-site context/span so it can raise a `RuntimeError`
/// that points at the call, not at the built-in's own (nonexistent) source.
pub type BuiltinFn = fn(&[Value], &Rc<Context>, &Position, &Position) -> Result<Value, RuntimeError>;

#[derive(Debug, Clone)]
pub enum ValueKind {
    Number(f64),
    String(String),
    /// `Rc<RefCell<..>>` so that builtins like `append`/`pop`/`extend` can
    /// mutate a list in place and have every alias observe the change
    /// (spec: "Values are immutable except for List ... via built-ins").
    List(Rc<RefCell<Vec<Value>>>),
    Function {
        name: Option<String>,
        body: Rc<Node>,
        params: Rc<Vec<String>>,
        auto_return: bool,
        captured_context: Rc<Context>,
        /// Distinct per definition; backs identity equality (spec: "Equality is identity").
        identity: Rc<()>,
    },
    BuiltinFunction {
        name: &'static str,
        params: Rc<Vec<String>>,
        func: BuiltinFn,
    },
}

/// A tagged runtime value. Position and context are optional metadata used
/// only for diagnostics; per spec they never participate in value equality.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub start: Option<Position>,
    pub end: Option<Position>,
    pub context: Option<Rc<Context>>,
}

impl Value {
    fn bare(kind: ValueKind) -> Self {
        Value {
            kind,
            start: None,
            end: None,
            context: None,
        }
    }

    pub fn number(n: f64) -> Self {
        Value::bare(ValueKind::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::bare(ValueKind::String(s.into()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::bare(ValueKind::List(Rc::new(RefCell::new(items))))
    }

    pub fn function(
        name: Option<String>,
        body: Rc<Node>,
        params: Vec<String>,
        auto_return: bool,
        captured_context: Rc<Context>,
    ) -> Self {
        Value::bare(ValueKind::Function {
            name,
            body,
            params: Rc::new(params),
            auto_return,
            captured_context,
            identity: Rc::new(()),
        })
    }

    pub fn builtin(name: &'static str, params: Vec<String>, func: BuiltinFn) -> Self {
        Value::bare(ValueKind::BuiltinFunction {
            name,
            params: Rc::new(params),
            func,
        })
    }

    pub fn with_position(mut self, start: Position, end: Position) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_context(mut self, context: Rc<Context>) -> Self {
        self.context = Some(context);
        self
    }

    /// Shallow copy: identical payload, fresh position/context slots for
    /// the caller to fill in (a call result's span is the call-site's
    /// span, not whatever span the value last carried).
    pub fn copy(&self) -> Self {
        Value {
            kind: self.kind.clone(),
            start: None,
            end: None,
            context: None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match &self.kind {
            ValueKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ValueKind::Number(_) => "Number",
            ValueKind::String(_) => "String",
            ValueKind::List(_) => "List",
            ValueKind::Function { .. } => "Function",
            ValueKind::BuiltinFunction { .. } => "BuiltinFunction",
        }
    }

    /// Per-variant truthiness: Number != 0, non-empty String, non-empty
    /// List, functions always true.
    pub fn is_true(&self) -> bool {
        match &self.kind {
            ValueKind::Number(n) => *n != 0.0,
            ValueKind::String(s) => !s.is_empty(),
            ValueKind::List(items) => !items.borrow().is_empty(),
            ValueKind::Function { .. } | ValueKind::BuiltinFunction { .. } => true,
        }
    }

    fn span_or_unknown(&self) -> (Position, Position) {
        (
            self.start.clone().unwrap_or_else(Position::unknown),
            self.end.clone().unwrap_or_else(Position::unknown),
        )
    }

    fn context_or_top_level(&self) -> Rc<Context> {
        self.context
            .clone()
            .unwrap_or_else(|| Context::top_level(crate::env::Environment::new()))
    }

    /// Illegal-operation errors point at the receiver's own span/context.
    fn illegal_operation(&self, _other: &Value) -> RuntimeError {
        let (start, end) = self.span_or_unknown();
        RuntimeError::IllegalOperation {
            start,
            end,
            context: self.context_or_top_level(),
        }
    }

    /// Division/modulo-by-zero errors point at the divisor's span/context,
    /// so the caret underlines the offending `0` literal rather than the
    /// left-hand operand.
    fn division_by_zero(&self, other: &Value) -> RuntimeError {
        let (start, end) = other.span_or_unknown();
        RuntimeError::DivisionByZero {
            start,
            end,
            context: other.context_or_top_level(),
        }
    }

    fn index_out_of_bounds(&self) -> RuntimeError {
        let (start, end) = self.span_or_unknown();
        RuntimeError::IndexOutOfBounds {
            start,
            end,
            context: self.context_or_top_level(),
        }
    }

    // ===== Binary operations =====

    pub fn add_to(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a + b)),
            (ValueKind::String(a), ValueKind::String(b)) => Ok(Value::string(format!("{a}{b}"))),
            (ValueKind::List(items), _) => {
                items.borrow_mut().push(other.copy());
                Ok(Value::bare(ValueKind::List(items.clone())))
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn subtract_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a - b)),
            (ValueKind::List(items), ValueKind::Number(n)) => {
                let mut snapshot = items.borrow().clone();
                let idx = *n as isize;
                if idx < 0 || idx as usize >= snapshot.len() {
                    return Err(self.index_out_of_bounds());
                }
                snapshot.remove(idx as usize);
                Ok(Value::list(snapshot))
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn multiply_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a * b)),
            (ValueKind::String(s), ValueKind::Number(n)) => {
                Ok(Value::string(s.repeat((*n).max(0.0) as usize)))
            }
            (ValueKind::List(a), ValueKind::List(b)) => {
                let mut combined = a.borrow().clone();
                combined.extend(b.borrow().iter().map(Value::copy));
                Ok(Value::list(combined))
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn power_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a.powf(*b))),
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn divide_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(_), ValueKind::Number(b)) if *b == 0.0 => {
                Err(self.division_by_zero(other))
            }
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a / b)),
            (ValueKind::List(items), ValueKind::Number(n)) => {
                let items = items.borrow();
                let idx = *n as isize;
                if idx < 0 || idx as usize >= items.len() {
                    return Err(self.index_out_of_bounds());
                }
                Ok(items[idx as usize].copy())
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn clean_divide_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(_), ValueKind::Number(b)) if *b == 0.0 => {
                Err(self.division_by_zero(other))
            }
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number((a / b).floor())),
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn modulo_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(_), ValueKind::Number(b)) if *b == 0.0 => {
                Err(self.division_by_zero(other))
            }
            // Floor-division modulo: the result takes the sign of the
            // divisor, matching `a - floor(a / b) * b` rather than Rust's
            // truncating `%`.
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(((a % b) + b) % b)),
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn negate(&self) -> Result<Value, RuntimeError> {
        self.multiply_by(&Value::number(-1.0))
    }

    /// Generalized across every variant via `is_true` rather than
    /// restricted to Number, since `NOT` in the language applies to
    /// whatever an expression evaluates to.
    pub fn notted(&self) -> Result<Value, RuntimeError> {
        Ok(Value::number(if self.is_true() { 0.0 } else { 1.0 }))
    }

    /// Generalized the same way: both sides are coerced via `is_true`
    /// rather than requiring Number operands.
    pub fn anded_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::number(
            (self.is_true() && other.is_true()) as u8 as f64,
        ))
    }

    pub fn ored_by(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::number(
            (self.is_true() || other.is_true()) as u8 as f64,
        ))
    }

    fn identity_ptr(&self) -> Option<*const ()> {
        match &self.kind {
            ValueKind::Function { identity, .. } => Some(Rc::as_ptr(identity)),
            ValueKind::BuiltinFunction { func, .. } => Some(*func as *const ()),
            _ => None,
        }
    }

    fn values_equal(&self, other: &Value) -> Option<bool> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Some(a == b),
            (ValueKind::String(a), ValueKind::String(b)) => Some(a == b),
            (ValueKind::Function { .. }, ValueKind::Function { .. })
            | (ValueKind::BuiltinFunction { .. }, ValueKind::BuiltinFunction { .. }) => {
                Some(self.identity_ptr() == other.identity_ptr())
            }
            _ => None,
        }
    }

    pub fn get_comparison_ee(&self, other: &Value) -> Result<Value, RuntimeError> {
        match self.values_equal(other) {
            Some(eq) => Ok(Value::number(eq as u8 as f64)),
            None => Err(self.illegal_operation(other)),
        }
    }

    pub fn get_comparison_ne(&self, other: &Value) -> Result<Value, RuntimeError> {
        match self.values_equal(other) {
            Some(eq) => Ok(Value::number(!eq as u8 as f64)),
            None => Err(self.illegal_operation(other)),
        }
    }

    fn numeric_comparison(
        &self,
        other: &Value,
        cmp: impl Fn(f64, f64) -> bool,
    ) -> Result<Value, RuntimeError> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => {
                Ok(Value::number(cmp(*a, *b) as u8 as f64))
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn get_comparison_lt(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_comparison(other, |a, b| a < b)
    }

    pub fn get_comparison_lte(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_comparison(other, |a, b| a <= b)
    }

    pub fn get_comparison_gt(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_comparison(other, |a, b| a > b)
    }

    pub fn get_comparison_gte(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_comparison(other, |a, b| a >= b)
    }

    /// Invokes a Function or BuiltinFunction value. Implements arity
    /// checking, fresh call context/environment, parameter binding, body
    /// evaluation, and return-value extraction.
    pub fn execute(
        &self,
        args: Vec<Value>,
        call_start: Position,
        call_end: Position,
        caller_context: &Rc<Context>,
    ) -> RuntimeResult {
        match &self.kind {
            ValueKind::Function {
                name,
                body,
                params,
                auto_return,
                captured_context,
                ..
            } => crate::eval::call_user_function(
                name.as_deref(),
                body,
                params,
                *auto_return,
                captured_context,
                args,
                call_start,
                call_end,
            ),
            ValueKind::BuiltinFunction { name, params, func } => {
                crate::eval::call_builtin_function(
                    name,
                    params,
                    *func,
                    caller_context.clone(),
                    args,
                    call_start,
                    call_end,
                )
            }
            _ => {
                let (start, end) = self.span_or_unknown();
                RuntimeResult::new().failure(RuntimeError::IllegalOperation {
                    start,
                    end,
                    context: caller_context.clone(),
                })
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ValueKind::Function { name, .. } => match name {
                Some(n) => write!(f, "<function {n}>"),
                None => write!(f, "<anonymous function>"),
            },
            ValueKind::BuiltinFunction { name, .. } => write!(f, "<built-in function {name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_print_without_decimal() {
        assert_eq!(Value::number(42.0).to_string(), "42");
        assert_eq!(Value::number(0.0).to_string(), "0");
    }

    #[test]
    fn fractional_numbers_print_with_decimal() {
        assert_eq!(Value::number(-2.5).to_string(), "-2.5");
    }

    #[test]
    fn string_display_is_unquoted() {
        assert_eq!(Value::string("hi").to_string(), "hi");
    }

    #[test]
    fn list_display_matches_element_order() {
        let list = Value::list(vec![Value::number(1.0), Value::number(2.0)]);
        assert_eq!(list.to_string(), "[1, 2]");
    }

    #[test]
    fn number_truthiness() {
        assert!(Value::number(1.0).is_true());
        assert!(!Value::number(0.0).is_true());
    }

    #[test]
    fn string_truthiness() {
        assert!(Value::string("x").is_true());
        assert!(!Value::string("").is_true());
    }

    #[test]
    fn list_truthiness() {
        assert!(Value::list(vec![Value::number(1.0)]).is_true());
        assert!(!Value::list(vec![]).is_true());
    }

    #[test]
    fn add_concatenates_strings() {
        let result = Value::string("foo").add_to(&Value::string("bar")).unwrap();
        assert_eq!(result.to_string(), "foobar");
    }

    #[test]
    fn add_appends_to_list_in_place() {
        let list = Value::list(vec![Value::number(1.0)]);
        let result = list.add_to(&Value::number(2.0)).unwrap();
        assert_eq!(result.to_string(), "[1, 2]");
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let err = Value::number(5.0).divide_by(&Value::number(0.0));
        assert!(matches!(err, Err(RuntimeError::DivisionByZero { .. })));
    }

    #[test]
    fn clean_divide_floors() {
        let result = Value::number(7.0)
            .clean_divide_by(&Value::number(2.0))
            .unwrap();
        assert_eq!(result.as_number(), Some(3.0));

        let result = Value::number(-7.0)
            .clean_divide_by(&Value::number(2.0))
            .unwrap();
        assert_eq!(result.as_number(), Some(-4.0));
    }

    #[test]
    fn modulo_takes_the_sign_of_the_divisor() {
        let modulo = Value::number(-7.0).modulo_by(&Value::number(2.0)).unwrap();
        assert_eq!(modulo.as_number(), Some(1.0));
    }

    #[test]
    fn modulo_matches_remainder_identity() {
        let a = Value::number(7.0);
        let b = Value::number(2.0);
        let quotient = a.clean_divide_by(&b).unwrap();
        let product = quotient.multiply_by(&b).unwrap();
        let remainder = a.subtract_by(&product).unwrap();
        let modulo = a.modulo_by(&b).unwrap();
        assert_eq!(remainder.as_number(), modulo.as_number());
    }

    #[test]
    fn list_division_indexes() {
        let list = Value::list(vec![
            Value::number(1.0),
            Value::number(2.0),
            Value::number(3.0),
        ]);
        let elem = list.divide_by(&Value::number(1.0)).unwrap();
        assert_eq!(elem.as_number(), Some(2.0));
    }

    #[test]
    fn list_division_out_of_range_is_index_error() {
        let list = Value::list(vec![Value::number(1.0)]);
        let err = list.divide_by(&Value::number(99.0));
        assert!(matches!(err, Err(RuntimeError::IndexOutOfBounds { .. })));
    }

    #[test]
    fn list_subtract_removes_by_index() {
        let list = Value::list(vec![
            Value::number(1.0),
            Value::number(2.0),
            Value::number(3.0),
        ]);
        let result = list.subtract_by(&Value::number(1.0)).unwrap();
        assert_eq!(result.to_string(), "[1, 3]");
    }

    #[test]
    fn illegal_operation_for_mismatched_types() {
        let err = Value::number(1.0).add_to(&Value::list(vec![]));
        assert!(matches!(err, Err(RuntimeError::IllegalOperation { .. })));
    }

    #[test]
    fn function_equality_is_identity() {
        use crate::context::Context;
        use crate::env::Environment;
        let ctx = Context::top_level(Environment::new());
        let body = Rc::new(Node::Number {
            value: 1.0,
            start: Position::unknown(),
            end: Position::unknown(),
        });
        let f1 = Value::function(Some("f".into()), body.clone(), vec![], true, ctx.clone());
        let f2 = Value::function(Some("f".into()), body, vec![], true, ctx);
        assert_eq!(
            f1.get_comparison_ee(&f1.copy()).unwrap().as_number(),
            Some(1.0)
        );
        assert_eq!(f1.get_comparison_ee(&f2).unwrap().as_number(), Some(0.0));
    }

    #[test]
    fn copy_preserves_payload_but_clears_position() {
        let v = Value::number(5.0).with_position(Position::unknown(), Position::unknown());
        let copied = v.copy();
        assert_eq!(copied.as_number(), v.as_number());
        assert!(copied.start.is_none());
    }
}
