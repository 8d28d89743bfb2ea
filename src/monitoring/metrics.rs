//! Prometheus metrics for the analytics path.
//!
//! Metrics live on a private [`Registry`] rather than the process-global one,
//! so several pipelines (and tests) can coexist without name clashes.

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::analytics::{AlertRecord, AnomalyEvent};
use crate::error::GreenflowResult;

/// Analytics metrics collector
#[derive(Clone)]
pub struct AnalyticsMetrics {
    registry: Registry,

    pub readings_total: IntCounter,
    pub anomalies_total: IntCounterVec,
    pub alerts_fired_total: IntCounterVec,
    pub persistence_failures_total: IntCounter,
    pub tracked_windows: IntGauge,
    pub simulations_total: IntCounter,
}

impl AnalyticsMetrics {
    /// Create and register all metrics
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let readings_total = IntCounter::new(
            "greenflow_readings_total",
            "Total number of readings processed",
        )?;
        let anomalies_total = IntCounterVec::new(
            Opts::new("greenflow_anomalies_total", "Anomalies detected per field"),
            &["field"],
        )?;
        let alerts_fired_total = IntCounterVec::new(
            Opts::new("greenflow_alerts_fired_total", "Alerts fired per severity"),
            &["severity"],
        )?;
        let persistence_failures_total = IntCounter::new(
            "greenflow_persistence_failures_total",
            "Alert batches the persistence sink rejected",
        )?;
        let tracked_windows = IntGauge::new(
            "greenflow_tracked_windows",
            "Sliding windows currently held in memory",
        )?;
        let simulations_total = IntCounter::new(
            "greenflow_simulations_total",
            "Total number of what-if simulations run",
        )?;

        registry.register(Box::new(readings_total.clone()))?;
        registry.register(Box::new(anomalies_total.clone()))?;
        registry.register(Box::new(alerts_fired_total.clone()))?;
        registry.register(Box::new(persistence_failures_total.clone()))?;
        registry.register(Box::new(tracked_windows.clone()))?;
        registry.register(Box::new(simulations_total.clone()))?;

        Ok(Self {
            registry,
            readings_total,
            anomalies_total,
            alerts_fired_total,
            persistence_failures_total,
            tracked_windows,
            simulations_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_anomalies(&self, events: &[AnomalyEvent]) {
        for event in events {
            self.anomalies_total
                .with_label_values(&[event.field.as_str()])
                .inc();
        }
    }

    pub fn record_alerts(&self, alerts: &[AlertRecord]) {
        for alert in alerts {
            self.alerts_fired_total
                .with_label_values(&[alert.severity.as_str()])
                .inc();
        }
    }

    /// Render all metrics in the Prometheus text format
    pub fn export_text(&self) -> GreenflowResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
