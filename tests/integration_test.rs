// ABOUTME: End-to-end tests driving the full lex/parse/eval pipeline

use simplescript::error::Diagnostic;
use simplescript::value::Value;
use simplescript::*;

fn run(src: &str) -> Result<Value, String> {
    run_source("<test>", src).map_err(|e| e.report())
}

#[test]
fn var_binding_with_arithmetic_precedence() {
    let value = run("VAR x = 5 + 2 * 3").unwrap();
    assert_eq!(value.as_number(), Some(11.0));
}

#[test]
fn if_elif_else_picks_first_matching_branch() {
    let value = run("IF 1 == 2 THEN 10 ELIF 3 > 1 THEN 20 ELSE 30").unwrap();
    assert_eq!(value.as_number(), Some(20.0));
}

#[test]
fn for_loop_without_step_collects_squares() {
    let value = run("FOR i = 0 TO 3 THEN i * i").unwrap();
    assert_eq!(value.to_string(), "[0, 1, 4]");
}

#[test]
fn function_call_and_wrong_arity_error() {
    let env = fresh_top_level();
    let tokens = lexer::tokenize("<t>", "FUN add(a, b) -> a + b\nadd(4, 5)").unwrap();
    let ast = parser::parse(tokens).unwrap();
    let result = eval::run(&ast, &env).unwrap();
    assert_eq!(result.as_number(), Some(9.0));

    let err = run("FUN add(a, b) -> a + b\nadd(1)").unwrap_err();
    assert!(err.contains("2 argument") || err.to_lowercase().contains("arity") || err.to_lowercase().contains("expected"));
}

#[test]
fn closure_captures_defining_scope() {
    let value = run(
        "FUN make_adder(n)\n  VAR f = FUN (x) -> x + n\n  RETURN f\nEND\nVAR g = make_adder(10)\ng(5)",
    )
    .unwrap();
    assert_eq!(value.as_number(), Some(15.0));
}

#[test]
fn while_loop_exits_via_break_and_yields_zero() {
    let value = run("WHILE 1 THEN IF 1 THEN BREAK END END").unwrap();
    assert_eq!(value.as_number(), Some(0.0));
}

#[test]
fn list_division_index_and_out_of_bounds_error() {
    let env = fresh_top_level();
    let tokens = lexer::tokenize("<t>", "VAR lst = [1, 2, 3]\nlst / 1").unwrap();
    let ast = parser::parse(tokens).unwrap();
    let result = eval::run(&ast, &env).unwrap();
    assert_eq!(result.as_number(), Some(2.0));

    let err = run("VAR lst = [1, 2, 3]\nlst / 99").unwrap_err();
    assert!(err.to_lowercase().contains("index") || err.to_lowercase().contains("bounds"));
}

#[test]
fn division_by_zero_reports_an_error() {
    let err = run("5 / 0").unwrap_err();
    assert!(err.to_lowercase().contains("division") || err.to_lowercase().contains("zero"));
}

#[test]
fn rebinding_outer_scope_does_not_leak_into_parent() {
    let env = fresh_top_level();
    let tokens = lexer::tokenize("<t>", "VAR x = 1\nFUN shadow()\n  VAR x = 2\n  RETURN x\nEND\nshadow()").unwrap();
    let ast = parser::parse(tokens).unwrap();
    let result = eval::run(&ast, &env).unwrap();
    assert_eq!(result.as_number(), Some(2.0));

    let tokens2 = lexer::tokenize("<t2>", "x").unwrap();
    let ast2 = parser::parse(tokens2).unwrap();
    let outer = eval::run(&ast2, &env).unwrap();
    assert_eq!(outer.as_number(), Some(1.0));
}

#[test]
fn closure_sees_rebound_variable_not_a_snapshot() {
    let env = fresh_top_level();
    let tokens = lexer::tokenize("<t>", "VAR n = 1\nFUN read() -> n\nVAR before = read()\nVAR n = 2\nVAR after = read()\n[before, after]").unwrap();
    let ast = parser::parse(tokens).unwrap();
    let result = eval::run(&ast, &env).unwrap();
    assert_eq!(result.to_string(), "[1, 2]");
}

#[test]
fn return_exits_the_enclosing_function_from_a_nested_loop() {
    let value = run(
        "FUN find()\n  FOR i = 0 TO 5 THEN\n    IF i == 2 THEN RETURN i END\n  END\n  RETURN -1\nEND\nfind()",
    )
    .unwrap();
    assert_eq!(value.as_number(), Some(2.0));
}

#[test]
fn and_or_always_evaluate_the_right_operand() {
    let err = run("0 AND undefined_name").unwrap_err();
    assert!(err.to_lowercase().contains("undefined") || err.to_lowercase().contains("not defined"));

    let err = run("1 OR undefined_name").unwrap_err();
    assert!(err.to_lowercase().contains("undefined") || err.to_lowercase().contains("not defined"));
}

#[test]
fn break_outside_a_loop_is_a_runtime_error() {
    let err = run("BREAK").unwrap_err();
    assert!(!err.is_empty());
}

#[test]
fn builtins_len_append_pop_extend_round_trip() {
    let value = run("VAR lst = [1, 2]\nappend(lst, 3)\nextend(lst, [4, 5])\npop(lst, 0)\nlen(lst)").unwrap();
    assert_eq!(value.as_number(), Some(4.0));
}

#[test]
fn type_predicate_builtins() {
    let value = run("[is_num(1), is_str(\"a\"), is_list([1]), is_fun(FUN (x) -> x)]").unwrap();
    assert_eq!(value.to_string(), "[1, 1, 1, 1]");
}
