mod common;

use common::*;
use rill::Value;

#[test]
fn test_int_list_to_string_round_trip() {
    let run = run_ok("print(toString(int[1, 2, 3]));");
    assert_eq!(run.output, vec!["[1, 2, 3]"]);
}

#[test]
fn test_string_list_literal() {
    let run = run_ok("print(toString(string[\"a\", \"b\"]));");
    assert_eq!(run.output, vec!["[a, b]"]);
}

#[test]
fn test_float_list_literal() {
    let run = run_ok("print(toString(float[1.5f, 2.5f]));");
    assert_eq!(run.output, vec!["[1.5, 2.5]"]);
}

#[test]
fn test_empty_list() {
    let run = run_ok("print(toString(int[]));");
    assert_eq!(run.output, vec!["[]"]);
}

#[test]
fn test_elements_keep_declaration_order() {
    let run = run_ok("print(toString(int[9, 8, 7, 6]));");
    assert_eq!(run.output, vec!["[9, 8, 7, 6]"]);
}

#[test]
fn test_elements_are_coerced_to_declared_type() {
    let run = run_ok("print(toString(int[1, 2.9f]));");
    assert_eq!(run.output, vec!["[1, 2]"]);
}

#[test]
fn test_uncoercible_element_is_cast_error() {
    let run = run_failed("x = int[1, \"two\"];");
    assert_eq!(
        run.output.last().unwrap(),
        "Unsupported cast from type string to type int"
    );
}

#[test]
fn test_invalid_element_type_is_runtime_error() {
    // bool is a registered type but has no list form; the parser accepts
    // it and evaluation rejects it
    let run = run_failed("x = bool[true];");
    assert_eq!(run.output.last().unwrap(), "Invalid type given: bool");
}

#[test]
fn test_index_read() {
    let run = run_ok(
        r#"
        data = int[10, 20, 30];
        x = data[1];
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(20)));
}

#[test]
fn test_index_with_expression() {
    let run = run_ok(
        r#"
        data = string["zero", "one", "two"];
        i = 1;
        print(data[i + 1]);
        "#,
    );
    assert_eq!(run.output, vec!["two"]);
}

#[test]
fn test_index_out_of_bounds_is_catchable() {
    let run = run_ok(
        r#"
        data = int[1, 2, 3];
        try {
            x = data[5];
        } catch (e) {
            print(e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["Index 5 out of bounds for list of length 3"]);
}

#[test]
fn test_indexing_non_list_is_error() {
    let run = run_failed(
        r#"
        n = 42;
        x = n[0];
        "#,
    );
    assert_eq!(run.output.last().unwrap(), "n is not a list");
}

#[test]
fn test_non_int_index_is_cast_error() {
    let run = run_failed(
        r#"
        data = int[1];
        x = data["zero"];
        "#,
    );
    assert_eq!(
        run.output.last().unwrap(),
        "Unsupported cast from type string to type int"
    );
}

#[test]
fn test_list_assignment_shares_the_list() {
    // Lists are reference values; equality compares identity
    let run = run_ok(
        r#"
        a = int[1, 2];
        b = a;
        same = a == b;
        "#,
    );
    assert_eq!(run.session.global("same"), Some(Value::Bool(true)));
}
