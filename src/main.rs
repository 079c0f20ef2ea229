use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser as _;
use owo_colors::OwoColorize;

use rill::cli::{self, AppConfig, Args, Commands};
use rill::interpreter::{Interpreter, PrintFn, RunOutcome, SearchPath};
use rill::logging;

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        cli::generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    logging::init(config.verbosity, config.color_enabled);

    let exit_code = match &args.filename {
        Some(file) => run_file(file, &config),
        None => run_interactive(&config),
    };
    std::process::exit(exit_code);
}

/// Module resolution looks in the source file's own directory first, then
/// in the current working directory.
fn search_path_for(file: Option<&Path>) -> SearchPath {
    let mut path = SearchPath::new();
    if let Some(file) = file {
        let resolved = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        if let Some(dir) = resolved.parent() {
            path.push(dir);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        path.push(cwd);
    }
    path
}

fn run_file(file: &Path, config: &AppConfig) -> i32 {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            error_message(config, &format!("Cannot read {}: {}", file.display(), e));
            return 1;
        }
    };
    logging::debug(
        "main",
        format_args!("read {} bytes from {}", source.len(), file.display()),
    );

    let file_name = file.to_string_lossy();
    let mut interpreter = Interpreter::new(
        stdout_sink(),
        search_path_for(Some(file)),
        Some(&file_name),
        false,
    );

    match interpreter.run(&source) {
        RunOutcome::Completed | RunOutcome::Incomplete => 0,
        RunOutcome::Syntax(error) => {
            error_message(config, &format!("SyntaxError: {}", error));
            1
        }
        RunOutcome::Failed => 1,
    }
}

fn run_interactive(config: &AppConfig) -> i32 {
    let mut interpreter = Interpreter::new(stdout_sink(), search_path_for(None), None, true);

    println!("Interactive console");
    prompt(">>> ");

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match interpreter.run(&(line + "\n")) {
            RunOutcome::Incomplete => prompt("... "),
            RunOutcome::Completed | RunOutcome::Failed => prompt(">>> "),
            RunOutcome::Syntax(error) => {
                error_message(config, &format!("SyntaxError: {}", error));
                prompt(">>> ");
            }
        }
    }
    0
}

fn stdout_sink() -> PrintFn {
    Box::new(|line: &str| println!("{}", line))
}

fn prompt(text: &str) {
    print!("{}", text);
    io::stdout().flush().ok();
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red());
    } else {
        eprintln!("{}", message);
    }
}
