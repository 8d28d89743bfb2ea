//! # greenflow
//!
//! Streaming analytics for environmental telemetry: CO₂, AQI, temperature,
//! humidity and derived risk scores reported by city sensors.
//!
//! Every reading passes through two stages:
//!
//! - **Anomaly detection** keeps a bounded sliding window per sensor and
//!   field and flags values that are statistical outliers, by z-score,
//!   by the interquartile-range fence, or both.
//! - **Alerting** classifies readings against a severity rule table and
//!   fires alerts for threshold breaches and detected anomalies, with a
//!   per-city cooldown so a sustained breach does not flood operators.
//!
//! Next to the alerting path sits a **what-if simulator** that estimates
//! how CO₂, AQI and risk would respond to traffic reduction, ventilation
//! boosts and industrial cutbacks, using a diminishing-returns model.
//!
//! ## Features
//!
//! - Per-sensor sliding-window statistics with idle eviction
//! - Combined z-score / IQR anomaly detection with cooldown
//! - Configurable threshold rules with four severity bands
//! - Cooldown-deduplicated alerts with bounded history
//! - Best-effort persistence through a pluggable [`sink::AlertSink`]
//! - Deterministic policy simulation with live or default baselines
//! - Prometheus metrics and health reporting
//! - TOML / JSON configuration with `GREENFLOW_*` environment overrides
//!
//! ## Basic Usage
//!
//! ```rust
//! use greenflow::prelude::*;
//!
//! let pipeline = AnalyticsPipeline::new(&GreenflowConfig::default()).unwrap();
//!
//! let reading = Reading::new("sensor-7")
//!     .with_city("Delhi")
//!     .with_value(Field::Aqi, 210.0);
//! let outcome = pipeline.process(&reading);
//!
//! assert_eq!(outcome.alerts.len(), 1);
//! assert_eq!(outcome.alerts[0].severity, Severity::High);
//! ```
//!
//! ## Simulation
//!
//! ```rust
//! use greenflow::simulation::{LiveBaseline, SimulationEngine, SimulationInput};
//!
//! let engine = SimulationEngine::new();
//! let input = SimulationInput::new(100.0, 0.0, 0.0);
//! let result = engine.simulate(&input, &LiveBaseline::default());
//!
//! assert!(result.new_predicted_co2 < result.baseline_co2);
//! ```
//!
//! ## CLI
//!
//! The `greenflow` binary exposes three subcommands:
//!
//! ```sh
//! greenflow simulate --traffic 40 --ventilation 20 --industry 10
//! greenflow replay --input readings.jsonl
//! greenflow rules --config greenflow.toml
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitoring;
pub mod pipeline;
pub mod simulation;
pub mod sink;
pub mod telemetry;

pub use analytics::{AlertEngine, AnomalyDetector, SlidingWindowStatistics, ThresholdEvaluator};
pub use config::GreenflowConfig;
pub use error::{GreenflowError, GreenflowResult};
pub use pipeline::AnalyticsPipeline;
pub use simulation::SimulationEngine;

pub mod prelude {
    pub use crate::analytics::{
        AlertEngine, AlertRecord, AnomalyDetector, AnomalyEvent, Severity, ThresholdEvaluator,
        ThresholdRule,
    };
    pub use crate::config::GreenflowConfig;
    pub use crate::error::{GreenflowError, GreenflowResult};
    pub use crate::pipeline::{AnalyticsPipeline, PipelineOutcome};
    pub use crate::simulation::{SimulationEngine, SimulationInput, SimulationResult};
    pub use crate::telemetry::{Field, Reading, Readings};
}
