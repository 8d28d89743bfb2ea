//! Logger setup for the `greenflow` binary.
//!
//! Library code only talks to the `log` facade. Binaries call
//! [`init_logging`] once at startup to route records to the terminal and,
//! optionally, a file.

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::config::LoggingConfig;
use crate::error::{GreenflowError, GreenflowResult};

/// Parse a level name such as `"debug"`. Unknown names fall back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn open_log_file(path: &Path) -> GreenflowResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global logger described by `config`.
///
/// Fails if a logger is already installed or the log file cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> GreenflowResult<()> {
    let level = parse_level(&config.level);
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if config.console_output {
        loggers.push(TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    if let Some(file_path) = &config.file_path {
        let file = open_log_file(Path::new(file_path))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    if loggers.is_empty() {
        log::set_max_level(LevelFilter::Off);
        return Ok(());
    }

    CombinedLogger::init(loggers)
        .map_err(|e| GreenflowError::Config(format!("failed to install logger: {}", e)))
}
