//! Streaming analytics: sliding-window statistics, anomaly detection,
//! threshold evaluation and alert fusion.

pub mod alerts;
pub mod anomaly;
pub mod cooldown;
pub mod severity;
pub mod stats;
pub mod threshold;

pub use alerts::{AlertEngine, AlertRecord};
pub use anomaly::{AnomalyDetector, AnomalyEvent};
pub use cooldown::CooldownTable;
pub use severity::Severity;
pub use stats::{SlidingWindow, SlidingWindowStatistics, WindowSnapshot};
pub use threshold::{ThresholdEvaluator, ThresholdRule, default_rules};
