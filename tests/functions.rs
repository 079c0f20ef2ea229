mod common;

use common::*;
use rill::Value;

#[test]
fn test_declaration_and_call() {
    let run = run_ok(
        r#"
        function add(a, b) {
            return a + b;
        }
        x = add(2, 3);
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(5)));
}

#[test]
fn test_fewer_arguments_fails_before_body_runs() {
    let run = run_failed(
        r#"
        function f(a, b) {
            print("body");
            return a;
        }
        x = f(1);
        "#,
    );
    assert!(!run.output.iter().any(|line| line == "body"));
    assert_eq!(run.output.last().unwrap(), "f expects 2 arguments; 1 passed");
}

#[test]
fn test_extra_arguments_are_ignored() {
    let run = run_ok(
        r#"
        function first(a) {
            return a;
        }
        x = first(1, 2, 3);
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(1)));
}

#[test]
fn test_arguments_bind_in_declaration_order() {
    let run = run_ok(
        r#"
        function pair(a, b) {
            return toString(a) + "," + toString(b);
        }
        print(pair(1, 2));
        "#,
    );
    assert_eq!(run.output, vec!["1,2"]);
}

#[test]
fn test_recursion_with_branching_returns() {
    let run = run_ok(
        r#"
        function fact(n) {
            if n < 2 {
                return 1;
            } else {
                return n * fact(n - 1);
            }
        }
        print(toString(fact(5)));
        "#,
    );
    assert_eq!(run.output, vec!["120"]);
}

#[test]
fn test_call_in_while_guard_retests_each_iteration() {
    let run = run_ok(
        r#"
        function under(n, limit) {
            return n < limit;
        }
        i = 0;
        while under(i, 3) {
            i = i + 1;
        }
        "#,
    );
    assert_eq!(run.session.global("i"), Some(Value::Int(3)));
}

#[test]
fn test_statement_after_two_call_expression_still_runs() {
    let run = run_ok(
        r#"
        function one() {
            return 1;
        }
        function two() {
            return 2;
        }
        x = one() + two();
        y = 100;
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(3)));
    assert_eq!(run.session.global("y"), Some(Value::Int(100)));
}

#[test]
fn test_dynamic_scoping_sees_caller_bindings() {
    // Lookup walks the live frame stack: the callee sees the caller's
    // locals, not its definition environment
    let run = run_ok(
        r#"
        function show() {
            print(toString(secret));
        }
        function caller() {
            secret = 42;
            show();
        }
        caller();
        "#,
    );
    assert_eq!(run.output, vec!["42"]);
}

#[test]
fn test_function_locals_do_not_leak() {
    let run = run_ok(
        r#"
        function f() {
            local = 9;
            return local;
        }
        x = f();
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(9)));
    assert_eq!(run.session.global("local"), None);
}

#[test]
fn test_unknown_function_is_name_error() {
    let run = run_failed("missing();");
    assert_eq!(run.output.last().unwrap(), "No such function: \"missing\"");
}

#[test]
fn test_calling_non_function_is_name_error() {
    let run = run_failed(
        r#"
        x = 5;
        x();
        "#,
    );
    assert_eq!(run.output.last().unwrap(), "x is not a function");
}

#[test]
fn test_duplicate_definition_is_error() {
    let run = run_failed(
        r#"
        function f() {
            return 1;
        }
        function f() {
            return 2;
        }
        "#,
    );
    assert_eq!(run.output.last().unwrap(), "f is already defined");
}

#[test]
fn test_function_binding_is_read_only_at_top_level() {
    let run = run_failed(
        r#"
        function f() {
            return 1;
        }
        f = 5;
        "#,
    );
    assert_eq!(run.output.last().unwrap(), "f is read only");
}

#[test]
fn test_outer_read_only_binding_is_shadowed_not_rejected() {
    let run = run_ok(
        r#"
        function f() {
            return 1;
        }
        function g() {
            f = 5;
            print(toString(f));
        }
        g();
        x = f();
        "#,
    );
    assert_eq!(run.output, vec!["5"]);
    // The global f is still the function
    assert_eq!(run.session.global("x"), Some(Value::Int(1)));
}

#[test]
fn test_lambda_assigned_and_called() {
    let run = run_ok(
        r#"
        square = x => {
            return x * x;
        };
        print(toString(square(4)));
        "#,
    );
    assert_eq!(run.output, vec!["16"]);
}

#[test]
fn test_return_at_top_level_is_error() {
    let run = run_failed("return 1;");
    assert_eq!(
        run.output.last().unwrap(),
        "Unexpected return outside of block"
    );
}

#[test]
fn test_bare_return_yields_null() {
    let run = run_ok(
        r#"
        function nothing() {
            return;
        }
        x = nothing();
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Null));
}
