// ABOUTME: Control-flow result carrier threading value/error/return/break/continue through the evaluator

use crate::error::RuntimeError;
use crate::value::Value;

/// The evaluator's universal return carrier. Exactly one of
/// {value-only, error, return_value, loop_should_break, loop_should_continue}
/// is meaningful at a time; every constructor below establishes that
/// discipline by resetting the others first.
#[derive(Debug, Default)]
pub struct RuntimeResult {
    pub value: Option<Value>,
    pub error: Option<RuntimeError>,
    pub return_value: Option<Value>,
    pub loop_should_break: bool,
    pub loop_should_continue: bool,
}

impl RuntimeResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.value = None;
        self.error = None;
        self.return_value = None;
        self.loop_should_break = false;
        self.loop_should_continue = false;
    }

    pub fn success(mut self, value: Value) -> Self {
        self.reset();
        self.value = Some(value);
        self
    }

    pub fn failure(mut self, error: RuntimeError) -> Self {
        self.reset();
        self.error = Some(error);
        self
    }

    pub fn success_return(mut self, value: Value) -> Self {
        self.reset();
        self.return_value = Some(value);
        self
    }

    pub fn success_continue(mut self) -> Self {
        self.reset();
        self.loop_should_continue = true;
        self
    }

    pub fn success_break(mut self) -> Self {
        self.reset();
        self.loop_should_break = true;
        self
    }

    /// True when any non-local signal (error, return, break, continue) is
    /// set. The evaluator tests this after every child evaluation and
    /// propagates unchanged if true, except loop bodies which intercept
    /// break/continue themselves.
    pub fn should_return(&self) -> bool {
        self.error.is_some()
            || self.return_value.is_some()
            || self.loop_should_break
            || self.loop_should_continue
    }

    /// Copies `other`'s error and control-flow signals into `self` and
    /// yields `other`'s value for direct use at the call site.
    pub fn register(&mut self, other: RuntimeResult) -> Option<Value> {
        if other.error.is_some() {
            self.error = other.error.clone();
        }
        if other.return_value.is_some() {
            self.return_value = other.return_value.clone();
        }
        self.loop_should_break = other.loop_should_break;
        self.loop_should_continue = other.loop_should_continue;
        other.value
    }
}
