mod common;

use common::*;
use rill::Value;

#[test]
fn test_catch_binds_thrown_message_as_string() {
    let run = run_ok(
        r#"
        try {
            throw("boom");
            print("unreachable");
        } catch (e) {
            print(e);
        }
        print("after");
        "#,
    );
    assert_eq!(run.output, vec!["boom", "after"]);
}

#[test]
fn test_catch_without_binding() {
    let run = run_ok(
        r#"
        x = 0;
        try {
            throw("ignored");
        } catch {
            x = 1;
        }
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(1)));
}

#[test]
fn test_catch_skipped_when_nothing_thrown() {
    let run = run_ok(
        r#"
        x = 0;
        try {
            x = 1;
        } catch (e) {
            x = 2;
        }
        "#,
    );
    assert_eq!(run.session.global("x"), Some(Value::Int(1)));
}

#[test]
fn test_runtime_errors_are_catchable() {
    let run = run_ok(
        r#"
        try {
            print(toString(missing_symbol));
        } catch (e) {
            print(e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["No such symbol: \"missing_symbol\""]);
}

#[test]
fn test_division_by_zero_is_catchable() {
    let run = run_ok(
        r#"
        try {
            x = 1 / 0;
        } catch (e) {
            print(e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["Division by zero"]);
}

#[test]
fn test_throw_unwinds_through_calls_to_enclosing_catch() {
    let run = run_ok(
        r#"
        function fail() {
            throw("deep");
        }
        function middle() {
            fail();
        }
        try {
            middle();
        } catch (e) {
            print(e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["deep"]);
}

#[test]
fn test_unhandled_throw_prints_backtrace_most_recent_first() {
    let run = run_failed(
        r#"
        function inner() {
            throw("kaboom");
        }
        function outer() {
            inner();
        }
        outer();
        "#,
    );
    assert_eq!(run.output[0], "Backtrace (most recent call first):");
    assert!(run.output[1].contains("throw(\"kaboom\");"), "{}", run.output[1]);
    assert!(run.output[2].contains("inner();"), "{}", run.output[2]);
    assert!(run.output[3].contains("outer();"), "{}", run.output[3]);
    assert_eq!(run.output.last().unwrap(), "kaboom");
}

#[test]
fn test_backtrace_lines_carry_file_line_column() {
    let run = run_failed("throw(\"lone\");");
    // `<source line> at <file>:<line>:<column>`
    assert!(
        run.output[1].contains("throw(\"lone\"); at <unnamed>:1:1"),
        "{}",
        run.output[1]
    );
}

#[test]
fn test_try_without_catch_is_error() {
    let run = run_failed(
        r#"
        try {
            x = 1;
        }
        x = 2;
        "#,
    );
    assert_eq!(run.output.last().unwrap(), "Expected catch block after try");
}

#[test]
fn test_session_continues_after_unhandled_error() {
    use rill::interpreter::{capture_sink, Interpreter, RunOutcome, SearchPath};

    let (print, lines) = capture_sink();
    let mut session = Interpreter::new(print, SearchPath::new(), None, false);

    assert!(matches!(
        session.run("throw(\"first\");"),
        RunOutcome::Failed
    ));
    assert!(matches!(session.run("x = 3;"), RunOutcome::Completed));
    assert_eq!(session.global("x"), Some(Value::Int(3)));
    assert_eq!(lines.borrow().last().unwrap(), "first");
}

#[test]
fn test_nested_try_catch_inner_handles() {
    let run = run_ok(
        r#"
        try {
            try {
                throw("inner");
            } catch (e) {
                print("caught " + e);
            }
            print("rest of outer try");
        } catch (e) {
            print("outer " + e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["caught inner", "rest of outer try"]);
}

#[test]
fn test_rethrow_from_catch_reaches_outer_catch() {
    let run = run_ok(
        r#"
        try {
            try {
                throw("original");
            } catch (e) {
                throw(e + " rethrown");
            }
        } catch (e) {
            print(e);
        }
        "#,
    );
    assert_eq!(run.output, vec!["original rethrown"]);
}

#[test]
fn test_indexed_assignment_is_error() {
    let run = run_failed(
        r#"
        data = int[1, 2, 3];
        data[0] = 9;
        "#,
    );
    assert_eq!(
        run.output.last().unwrap(),
        "Identifier expected for assignment"
    );
}
