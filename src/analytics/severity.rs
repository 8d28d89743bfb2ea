//! Severity ladder shared by anomaly events and alerts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity escalation ladder shared by anomaly events and alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Log level used when an alert of this severity fires.
    ///
    /// `log` has no level above `Error`, so HIGH and CRITICAL share it.
    pub fn log_level(&self) -> log::Level {
        match self {
            Severity::Critical | Severity::High => log::Level::Error,
            Severity::Medium => log::Level::Warn,
            Severity::Low => log::Level::Info,
        }
    }

    /// Classify a z-score into a severity. No z-score means LOW.
    pub fn from_z_score(z: Option<f64>) -> Self {
        match z {
            Some(z) if z > 5.0 => Severity::Critical,
            Some(z) if z > 4.0 => Severity::High,
            Some(z) if z > 3.0 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
