//! Error types shared across the crate.
//!
//! The analytic core itself never fails: bad sensor values are skipped and
//! missing history only disables a detection path. The variants below cover
//! the edges around it, such as loading rule tables and configuration,
//! decoding readings, and talking to persistence or baseline collaborators.

use thiserror::Error;

/// Result alias used by fallible greenflow operations
pub type GreenflowResult<T> = Result<T, GreenflowError>;

/// Errors raised at the boundaries of the analytics core
#[derive(Error, Debug)]
pub enum GreenflowError {
    #[error("Invalid threshold rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Unknown telemetry field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Baseline source error: {0}")]
    Baseline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
