//! Alert fusion for threshold breaches and anomaly events.
//!
//! Two pathways feed the same dedup gate:
//!
//! - threshold alerts, where a field crosses a static bound in the rule table
//! - anomaly alerts, built from [`AnomalyEvent`]s produced by the detector
//!
//! Alerts are keyed by city and alert type. A key that fired within the
//! cooldown window stays quiet, which keeps a noisy sensor from flooding
//! downstream consumers.

use chrono::{DateTime, Utc};
use log::log;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::analytics::anomaly::AnomalyEvent;
use crate::analytics::cooldown::CooldownTable;
use crate::analytics::severity::Severity;
use crate::analytics::threshold::ThresholdEvaluator;
use crate::clock::{Clock, SystemClock};
use crate::config::AlertConfig;
use crate::error::GreenflowResult;
use crate::sink::{AlertSink, persist_best_effort};
use crate::telemetry::Readings;

/// A fired alert. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_type: String,
    pub severity: Severity,
    pub message: String,
    pub city: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Threshold + anomaly alert engine
pub struct AlertEngine {
    evaluator: ThresholdEvaluator,
    cooldowns: CooldownTable<String>,
    history: Mutex<VecDeque<AlertRecord>>,
    history_capacity: usize,
    total_fired: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl AlertEngine {
    /// Create an engine, validating the configured rule table
    pub fn new(config: AlertConfig) -> GreenflowResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AlertConfig, clock: Arc<dyn Clock>) -> GreenflowResult<Self> {
        let evaluator = ThresholdEvaluator::new(config.rules.clone())?;
        Ok(Self {
            evaluator,
            cooldowns: CooldownTable::new(config.cooldown()),
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
            history_capacity: config.history_capacity,
            total_fired: AtomicU64::new(0),
            clock,
        })
    }

    pub fn evaluator(&self) -> &ThresholdEvaluator {
        &self.evaluator
    }

    /// Evaluate readings and anomaly events, returning newly fired alerts
    pub fn evaluate(
        &self,
        readings: &Readings,
        city: Option<&str>,
        anomalies: &[AnomalyEvent],
    ) -> Vec<AlertRecord> {
        let mut fired = Vec::new();

        // Threshold rules
        for rule in self.evaluator.rules() {
            let Some(&value) = readings.get(&rule.field) else {
                continue;
            };
            let Some(severity) = ThresholdEvaluator::classify(rule, value) else {
                continue;
            };
            let message = format!(
                "{} reached {:.1}{} in {} — {} alert.",
                rule.field,
                value,
                rule.unit,
                city.unwrap_or("unknown city"),
                severity
            );
            if let Some(alert) = self.maybe_fire(&rule.alert_type, severity, message, city) {
                fired.push(alert);
            }
        }

        // Anomaly events
        for event in anomalies {
            let alert_type = format!("ANOMALY_{}", event.field.as_str().to_uppercase());
            if let Some(alert) =
                self.maybe_fire(&alert_type, event.severity, event.message.clone(), city)
            {
                fired.push(alert);
            }
        }

        fired
    }

    /// Evaluate, then hand fired alerts to `sink`. Persistence failures are
    /// logged and never surface to the caller.
    pub async fn evaluate_async(
        &self,
        readings: &Readings,
        city: Option<&str>,
        anomalies: &[AnomalyEvent],
        sink: Option<&dyn AlertSink>,
    ) -> Vec<AlertRecord> {
        let alerts = self.evaluate(readings, city, anomalies);
        if let Some(sink) = sink {
            persist_best_effort(sink, &alerts, None).await;
        }
        alerts
    }

    /// Most recent alerts, newest first
    pub fn recent(&self, limit: usize) -> Vec<AlertRecord> {
        self.history.lock().iter().take(limit).cloned().collect()
    }

    /// Alerts fired since the engine was created
    pub fn total_fired(&self) -> u64 {
        self.total_fired.load(Ordering::Relaxed)
    }

    fn maybe_fire(
        &self,
        alert_type: &str,
        severity: Severity,
        message: String,
        city: Option<&str>,
    ) -> Option<AlertRecord> {
        let key = format!("{}:{}", city.unwrap_or("_"), alert_type);
        let now = self.clock.now();
        if !self.cooldowns.try_fire(key, now) {
            return None;
        }

        let record = AlertRecord {
            alert_type: alert_type.to_string(),
            severity,
            message,
            city: city.map(str::to_string),
            timestamp: now,
        };

        {
            let mut history = self.history.lock();
            history.push_front(record.clone());
            history.truncate(self.history_capacity);
        }
        self.total_fired.fetch_add(1, Ordering::Relaxed);

        log!(
            severity.log_level(),
            "Alert | type={} sev={} city={} msg={}",
            record.alert_type,
            record.severity,
            city.unwrap_or("-"),
            record.message
        );

        Some(record)
    }
}
