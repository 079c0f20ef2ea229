pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod frame;
pub mod parser;
pub mod token_buffer;

pub use error::RuntimeError;
pub use evaluator::{Evaluator, ExecOutcome, PrintFn};
pub use parser::{Parser, SearchPath, SyntaxError};
pub use token_buffer::TokenBuffer;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Program;
use crate::value::Value;

/// Result of feeding one chunk of source to a session.
#[derive(Debug)]
pub enum RunOutcome {
    Completed,
    /// Interactive input is not yet balanced; buffer and ask for more.
    Incomplete,
    Syntax(SyntaxError),
    /// A runtime error went unhandled; backtrace and message were reported
    /// through the sink. The session remains usable.
    Failed,
}

/// A parser/evaluator pair sharing one growing program arena. Frame stack,
/// value stack and cursor survive across `run` calls, so interactive input
/// can be fed line by line.
pub struct Interpreter {
    program: Program,
    parser: Parser,
    evaluator: Evaluator,
}

impl Interpreter {
    pub fn new(
        print: PrintFn,
        path: SearchPath,
        file_name: Option<&str>,
        interactive: bool,
    ) -> Self {
        Interpreter {
            program: Program::new(),
            parser: Parser::new(file_name, path, interactive),
            evaluator: Evaluator::new(print),
        }
    }

    pub fn run(&mut self, source: &str) -> RunOutcome {
        match self.parser.parse(source, &mut self.program) {
            Ok(None) => RunOutcome::Incomplete,
            Ok(Some(root)) => match self.evaluator.execute(&self.program, root) {
                ExecOutcome::Completed => RunOutcome::Completed,
                ExecOutcome::Failed => RunOutcome::Failed,
            },
            Err(error) => RunOutcome::Syntax(error),
        }
    }

    /// A global binding's current value.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.evaluator.global(name)
    }
}

/// A capturing sink: everything printed lands in the returned buffer.
pub fn capture_sink() -> (PrintFn, Rc<RefCell<Vec<String>>>) {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = lines.clone();
    let print: PrintFn = Box::new(move |line: &str| sink.borrow_mut().push(line.to_string()));
    (print, lines)
}

pub struct ProgramRun {
    pub outcome: RunOutcome,
    pub output: Vec<String>,
    pub session: Interpreter,
}

/// One-call harness: runs a complete program in batch mode and captures
/// everything it printed.
pub fn run_program(source: &str) -> ProgramRun {
    let (print, lines) = capture_sink();
    let mut session = Interpreter::new(print, SearchPath::new(), None, false);
    let outcome = session.run(source);
    let output = lines.borrow().clone();
    ProgramRun {
        outcome,
        output,
        session,
    }
}
