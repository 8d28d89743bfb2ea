//! CLI error types

use greenflow::GreenflowError;
use std::fmt;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    UnknownCommand(String),
    NoCommand,
    ConfigurationError(String),
    IoError(String),
    ParseError { field: String, message: String },
    Analytics(GreenflowError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::UnknownCommand(cmd) => {
                write!(f, "Unknown command '{}'. Use --help to see available commands", cmd)
            }
            CliError::NoCommand => {
                write!(f, "No command provided. Use --help to see available commands")
            }
            CliError::ConfigurationError(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            CliError::IoError(msg) => {
                write!(f, "IO error: {}", msg)
            }
            CliError::ParseError { field, message } => {
                if field.is_empty() {
                    write!(f, "Parse error: {}", message)
                } else {
                    write!(f, "Parse error ({}): {}", field, message)
                }
            }
            CliError::Analytics(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError(err.to_string())
    }
}

impl From<GreenflowError> for CliError {
    fn from(err: GreenflowError) -> Self {
        match err {
            GreenflowError::Config(msg) => CliError::ConfigurationError(msg),
            other => CliError::Analytics(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::ParseError {
            field: String::new(),
            message: err.to_string(),
        }
    }
}
