use crate::types::Type;

/// A language-level runtime error. Every variant unwinds toward the nearest
/// enclosing `catch`; only frame-stack exhaustion promotes one to an
/// unhandled report. The `Display` strings are exactly what scripts observe
/// through `catch (e)`.
///
/// Host-level invariant violations (evaluator scheduling bugs) are not
/// represented here; those abort.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Undefined symbol or function, non-function callee, read-only
    /// violation, duplicate definition.
    Name(String),
    /// Conversion with no casting-table entry.
    Cast { from: Type, to: Type },
    /// Operator applied to a representation that does not support it.
    InvalidOperation(String),
    /// Wrong argument count for a user function or builtin.
    Arity(String),
    DivisionByZero,
    IndexOutOfBounds { index: i64, length: usize },
    BreakOutsideLoop,
    ReturnOutsideBlock,
    MissingCatchAfterTry,
    /// A dangling `else`/`elseif` reached without a preceding conditional.
    UnexpectedElse(&'static str),
    /// Raised by the `throw` builtin.
    Thrown(String),
}

impl RuntimeError {
    pub fn name(message: impl Into<String>) -> Self {
        RuntimeError::Name(message.into())
    }

    pub fn unsupported_cast(from: Type, to: Type) -> Self {
        RuntimeError::Cast { from, to }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        RuntimeError::InvalidOperation(message.into())
    }

    pub fn arity(name: &str, expected: usize, passed: usize) -> Self {
        RuntimeError::Arity(format!(
            "{} expects {} arguments; {} passed",
            name, expected, passed
        ))
    }

    pub fn thrown(message: impl Into<String>) -> Self {
        RuntimeError::Thrown(message.into())
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Name(message) => write!(f, "{}", message),
            RuntimeError::Cast { from, to } => {
                write!(f, "Unsupported cast from type {} to type {}", from, to)
            }
            RuntimeError::InvalidOperation(message) => write!(f, "{}", message),
            RuntimeError::Arity(message) => write!(f, "{}", message),
            RuntimeError::DivisionByZero => write!(f, "Division by zero"),
            RuntimeError::IndexOutOfBounds { index, length } => {
                write!(f, "Index {} out of bounds for list of length {}", index, length)
            }
            RuntimeError::BreakOutsideLoop => write!(f, "Unexpected break outside of loop"),
            RuntimeError::ReturnOutsideBlock => write!(f, "Unexpected return outside of block"),
            RuntimeError::MissingCatchAfterTry => write!(f, "Expected catch block after try"),
            RuntimeError::UnexpectedElse(keyword) => write!(f, "Unexpected {}", keyword),
            RuntimeError::Thrown(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_message_names_both_keywords() {
        let err = RuntimeError::unsupported_cast(Type::String, Type::Int);
        assert_eq!(
            err.to_string(),
            "Unsupported cast from type string to type int"
        );
    }

    #[test]
    fn test_arity_message() {
        let err = RuntimeError::arity("f", 2, 1);
        assert_eq!(err.to_string(), "f expects 2 arguments; 1 passed");
    }

    #[test]
    fn test_structural_messages() {
        assert_eq!(
            RuntimeError::BreakOutsideLoop.to_string(),
            "Unexpected break outside of loop"
        );
        assert_eq!(
            RuntimeError::MissingCatchAfterTry.to_string(),
            "Expected catch block after try"
        );
        assert_eq!(
            RuntimeError::UnexpectedElse("elseif").to_string(),
            "Unexpected elseif"
        );
    }
}
