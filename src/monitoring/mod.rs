/// Prometheus metrics for readings, anomalies, alerts and simulations
pub mod metrics;

/// Component health checks
pub mod health;

pub use health::{ComponentHealth, HealthStatus, check_alert_dispatcher, check_anomaly_detector};
pub use metrics::AnalyticsMetrics;
