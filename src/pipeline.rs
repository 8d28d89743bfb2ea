//! Wiring of the alerting path.
//!
//! [`AnalyticsPipeline`] owns the detector, the alert engine and everything
//! that hangs off them. A reading goes through the detector first; the same
//! reading plus the anomalies it produced then goes through the alert engine,
//! and any fired alerts are queued for persistence.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::analytics::{AlertEngine, AlertRecord, AnomalyDetector, AnomalyEvent};
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::GreenflowConfig;
use crate::error::{GreenflowError, GreenflowResult};
use crate::monitoring::{
    AnalyticsMetrics, ComponentHealth, HealthStatus, check_alert_dispatcher,
    check_anomaly_detector,
};
use crate::simulation::{
    LatestReadings, SimulationEngine, SimulationInput, SimulationResult, simulate_live,
};
use crate::sink::{AlertDispatcher, AlertSink};
use crate::telemetry::{Field, Reading};

/// Number of anomaly events counted as "recent" in a snapshot
const RECENT_ANOMALIES: usize = 50;
/// Number of alerts listed in a snapshot
const RECENT_ALERTS: usize = 10;
/// Windows beyond this mark the detector as degraded
const WINDOW_BUDGET: usize = 50_000;

/// What one reading produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub anomalies: Vec<AnomalyEvent>,
    pub alerts: Vec<AlertRecord>,
}

/// Point-in-time view for a metrics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub anomalies_recent: usize,
    pub alerts_total: u64,
    pub alerts_recent: Vec<AlertRecord>,
    pub window_stats: BTreeMap<String, BTreeMap<Field, usize>>,
}

/// Detector, alert engine and their collaborators
pub struct AnalyticsPipeline {
    detector: Arc<AnomalyDetector>,
    alerts: Arc<AlertEngine>,
    simulator: SimulationEngine,
    latest: Arc<LatestReadings>,
    dispatcher: Option<AlertDispatcher>,
    metrics: Option<Arc<AnalyticsMetrics>>,
    /// Set in replay mode; follows the timestamp of each processed reading
    replay_clock: Option<Arc<ManualClock>>,
    eviction_interval: u64,
    processed: AtomicU64,
}

impl AnalyticsPipeline {
    pub fn new(config: &GreenflowConfig) -> GreenflowResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Pipeline for recorded telemetry. Cooldowns and idle eviction are
    /// measured against each reading's own timestamp instead of wall time.
    pub fn replaying(config: &GreenflowConfig) -> GreenflowResult<Self> {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::default()));
        let mut pipeline = Self::with_clock(config, clock.clone())?;
        pipeline.replay_clock = Some(clock);
        Ok(pipeline)
    }

    pub fn with_clock(config: &GreenflowConfig, clock: Arc<dyn Clock>) -> GreenflowResult<Self> {
        config
            .validate()
            .map_err(|errors| GreenflowError::Config(errors.join(", ")))?;

        let detector = AnomalyDetector::with_clock(config.anomaly.clone(), clock.clone());
        let alerts = AlertEngine::with_clock(config.alerting.clone(), clock)?;
        let metrics = if config.monitoring.metrics_enabled {
            Some(Arc::new(AnalyticsMetrics::new()?))
        } else {
            None
        };

        info!(
            "Analytics pipeline ready: window={} z={} rules={}",
            config.anomaly.window_size,
            config.anomaly.z_threshold,
            alerts.evaluator().rules().len()
        );

        Ok(Self {
            detector: Arc::new(detector),
            alerts: Arc::new(alerts),
            simulator: SimulationEngine::new(),
            latest: Arc::new(LatestReadings::new()),
            dispatcher: None,
            metrics,
            replay_clock: None,
            eviction_interval: config.monitoring.eviction_interval,
            processed: AtomicU64::new(0),
        })
    }

    /// Queue fired alerts for `sink` through a bounded dispatcher.
    /// Must be called inside a tokio runtime.
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>, queue_capacity: usize) -> Self {
        self.dispatcher = Some(AlertDispatcher::spawn(
            sink,
            queue_capacity,
            self.metrics.clone(),
        ));
        self
    }

    pub fn detector(&self) -> &Arc<AnomalyDetector> {
        &self.detector
    }

    pub fn alert_engine(&self) -> &Arc<AlertEngine> {
        &self.alerts
    }

    pub fn latest(&self) -> &Arc<LatestReadings> {
        &self.latest
    }

    pub fn metrics(&self) -> Option<&Arc<AnalyticsMetrics>> {
        self.metrics.as_ref()
    }

    /// Run one reading through detection and alerting
    pub fn process(&self, reading: &Reading) -> PipelineOutcome {
        if let Some(clock) = &self.replay_clock {
            clock.set(reading.timestamp);
        }
        let anomalies = self.detector.ingest(&reading.sensor_id, &reading.values);
        let alerts = self
            .alerts
            .evaluate(&reading.values, reading.city.as_deref(), &anomalies);
        self.latest.observe(&reading.values);

        if let Some(metrics) = &self.metrics {
            metrics.readings_total.inc();
            metrics.record_anomalies(&anomalies);
            metrics.record_alerts(&alerts);
        }

        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(alerts.clone());
        }

        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.eviction_interval > 0 && processed % self.eviction_interval == 0 {
            let evicted = self.detector.evict_idle();
            if evicted > 0 {
                debug!("Evicted {} idle window(s)", evicted);
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics
                .tracked_windows
                .set(self.detector.tracked_windows() as i64);
        }

        PipelineOutcome { anomalies, alerts }
    }

    /// Run a simulation against the latest values this pipeline has seen
    pub async fn simulate(&self, input: &SimulationInput) -> SimulationResult {
        let result = simulate_live(&self.simulator, input, self.latest.as_ref()).await;
        if let Some(metrics) = &self.metrics {
            metrics.simulations_total.inc();
        }
        result
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            anomalies_recent: self.detector.recent(RECENT_ANOMALIES).len(),
            alerts_total: self.alerts.total_fired(),
            alerts_recent: self.alerts.recent(RECENT_ALERTS),
            window_stats: self.detector.window_stats(),
        }
    }

    pub fn health(&self) -> ComponentHealth {
        check_anomaly_detector(&self.detector, WINDOW_BUDGET)
    }

    /// Persistence health, `None` when no sink is attached
    pub fn dispatcher_health(&self) -> Option<ComponentHealth> {
        self.dispatcher.as_ref().map(check_alert_dispatcher)
    }

    /// Flush queued alerts to the sink and stop the dispatcher
    pub async fn shutdown(self) {
        if let Some(dispatcher) = self.dispatcher {
            let health = check_alert_dispatcher(&dispatcher);
            if health.status == HealthStatus::Failed {
                warn!("Alerts may be missing from the sink: {}", health.detail);
            }
            let dropped = dispatcher.dropped_batches();
            dispatcher.shutdown().await;
            if dropped > 0 {
                info!("Pipeline stopped; {} alert batch(es) were dropped", dropped);
            }
        }
    }
}
