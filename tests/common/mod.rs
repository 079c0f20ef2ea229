use rill::interpreter::{run_program, ProgramRun, RunOutcome};

/// Runs a program that is expected to complete without unhandled errors.
pub fn run_ok(source: &str) -> ProgramRun {
    let run = run_program(source);
    assert!(
        matches!(run.outcome, RunOutcome::Completed),
        "program did not complete: {:?}\noutput: {:?}",
        run.outcome,
        run.output
    );
    run
}

/// Runs a program expected to die with an unhandled runtime error; the
/// output ends with the backtrace and the error message.
#[allow(dead_code)]
pub fn run_failed(source: &str) -> ProgramRun {
    let run = run_program(source);
    assert!(
        matches!(run.outcome, RunOutcome::Failed),
        "expected an unhandled error: {:?}\noutput: {:?}",
        run.outcome,
        run.output
    );
    run
}
