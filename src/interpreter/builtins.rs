//! Native functions callable from scripts: `print`, `toString`, `random`
//! and `throw`. Dispatch is an explicit name match with declared arities,
//! verified complete against `BUILTIN_NAMES` at evaluator startup; builtin
//! placeholders in the global frame point here.

use rand::Rng;

use crate::types::Type;
use crate::value::Value;

use super::error::RuntimeError;

/// Every builtin a script can name. The evaluator seeds its global frame
/// with a read-only placeholder for each.
pub const BUILTIN_NAMES: &[&str] = &["print", "toString", "random", "throw"];

/// Declared parameter count, checked by the call site before dispatch.
pub fn arity_of(name: &str) -> Option<usize> {
    match name {
        "print" => Some(1),
        "toString" => Some(1),
        "random" => Some(0),
        "throw" => Some(1),
        _ => None,
    }
}

/// Asserts that every declared builtin has a registered arity; run once at
/// evaluator startup.
pub fn check_registry() {
    for name in BUILTIN_NAMES {
        assert!(
            arity_of(name).is_some(),
            "builtin {} has no registered arity",
            name
        );
    }
}

/// Invokes a builtin with arguments in declaration order. The sink receives
/// one line per `print` call.
pub fn dispatch(
    name: &str,
    args: &[Value],
    print: impl FnMut(&str),
) -> Result<Value, RuntimeError> {
    match name {
        "print" => builtin_print(args, print),
        "toString" => builtin_to_string(args),
        "random" => builtin_random(),
        "throw" => builtin_throw(args),
        _ => Err(RuntimeError::name(format!(
            "No such function: \"{}\"",
            name
        ))),
    }
}

pub fn builtin_to_string(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Str(args[0].display().into()))
}

pub fn builtin_print(
    args: &[Value],
    mut print: impl FnMut(&str),
) -> Result<Value, RuntimeError> {
    print(&args[0].display());
    Ok(Value::Null)
}

pub fn builtin_random() -> Result<Value, RuntimeError> {
    let value = rand::thread_rng().gen_range(0..i64::from(i32::MAX));
    Ok(Value::Int(value))
}

pub fn builtin_throw(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Str(message) => Err(RuntimeError::thrown(message.to_string())),
        other => Err(RuntimeError::unsupported_cast(
            other.type_tag(),
            Type::String,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_registry_is_complete() {
        check_registry();
    }

    #[test]
    fn test_to_string_formats_list() {
        let list = Value::IntList(Rc::new(RefCell::new(vec![1, 2, 3])));
        let result = builtin_to_string(&[list]).unwrap();
        assert_eq!(result, Value::Str("[1, 2, 3]".into()));
    }

    #[test]
    fn test_print_goes_through_sink() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        let result =
            builtin_print(&[Value::Int(42)], move |line| sink.borrow_mut().push(line.to_string()))
                .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(&*lines.borrow(), &["42".to_string()]);
    }

    #[test]
    fn test_random_is_non_negative_int() {
        for _ in 0..16 {
            match builtin_random().unwrap() {
                Value::Int(n) => assert!(n >= 0),
                other => panic!("expected int, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_throw_raises_message() {
        let err = builtin_throw(&[Value::Str("boom".into())]).unwrap_err();
        assert_eq!(err, RuntimeError::Thrown("boom".to_string()));
    }

    #[test]
    fn test_throw_requires_string() {
        let err = builtin_throw(&[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported cast from type int to type string"
        );
    }
}
