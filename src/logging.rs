//! Verbosity-gated logging to stderr, configured once at startup from the
//! CLI flag. Each line is `LEVEL | component | message`.

use std::sync::OnceLock;

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Verbosity {
    Debug,
    Info,
    None,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::None => "none",
        };
        write!(f, "{}", name)
    }
}

struct LogConfig {
    verbosity: Verbosity,
    colors: bool,
}

static CONFIG: OnceLock<LogConfig> = OnceLock::new();

pub fn init(verbosity: Verbosity, colors: bool) {
    let _ = CONFIG.set(LogConfig { verbosity, colors });
}

fn config() -> &'static LogConfig {
    CONFIG.get_or_init(|| LogConfig {
        verbosity: Verbosity::None,
        colors: false,
    })
}

pub fn debug(component: &str, message: std::fmt::Arguments<'_>) {
    if config().verbosity == Verbosity::Debug {
        emit("DEBUG", component, message);
    }
}

pub fn info(component: &str, message: std::fmt::Arguments<'_>) {
    if config().verbosity <= Verbosity::Info {
        emit("INFO", component, message);
    }
}

pub fn error(component: &str, message: std::fmt::Arguments<'_>) {
    if config().verbosity != Verbosity::None {
        emit("ERROR", component, message);
    }
}

fn emit(level: &str, component: &str, message: std::fmt::Arguments<'_>) {
    if config().colors {
        let level = match level {
            "INFO" => level.magenta().bold().to_string(),
            "ERROR" => level.red().bold().to_string(),
            _ => level.dimmed().to_string(),
        };
        eprintln!("{} | {} | {}", level, component, message);
    } else {
        eprintln!("{} | {} | {}", level, component, message);
    }
}
