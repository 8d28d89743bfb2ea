//! Per-sensor statistical anomaly detection.
//!
//! Every (sensor, field) series is judged against its own recent history,
//! never a global baseline. Two detectors run side by side:
//!
//! - a z-score test against the window mean and sample deviation
//! - a Tukey fence on the window's interquartile range, which copes better
//!   with skewed series but needs more history
//!
//! A value is anomalous when either one fires. Repeat detections for the same
//! series are muted for a cooldown period.

use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use crate::analytics::cooldown::CooldownTable;
use crate::analytics::severity::Severity;
use crate::analytics::stats::{SlidingWindowStatistics, WindowSnapshot, quartiles, round_to};
use crate::clock::{Clock, SystemClock};
use crate::config::AnomalyConfig;
use crate::telemetry::{Field, Readings, SensorKey};

/// Deviations at or below this are treated as zero
const STD_EPSILON: f64 = 1e-10;

/// A detected outlier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub sensor_id: String,
    pub field: Field,
    pub value: f64,
    pub z_score: Option<f64>,
    pub iqr_flag: bool,
    #[serde(serialize_with = "round3")]
    pub mean: f64,
    #[serde(serialize_with = "round3")]
    pub std: f64,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

/// Dual-method (z-score + IQR) outlier detector
pub struct AnomalyDetector {
    config: AnomalyConfig,
    windows: SlidingWindowStatistics,
    cooldowns: CooldownTable<SensorKey>,
    history: Mutex<VecDeque<AnomalyEvent>>,
    clock: Arc<dyn Clock>,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AnomalyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: SlidingWindowStatistics::new(config.window_size),
            cooldowns: CooldownTable::new(config.cooldown()),
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Feed one sensor's readings and return the anomalies they produced.
    ///
    /// Non-finite values are skipped; every other value lands in its window
    /// whether or not it is flagged.
    pub fn ingest(&self, sensor_id: &str, readings: &Readings) -> Vec<AnomalyEvent> {
        let mut found = Vec::new();

        for (&field, &value) in readings {
            if !value.is_finite() {
                continue;
            }
            if let Some(event) = self.check(sensor_id, field, value) {
                warn!(
                    "Anomaly | sensor={} field={} value={:.2} z={:?} severity={}",
                    sensor_id, field, value, event.z_score, event.severity
                );
                self.remember(event.clone());
                found.push(event);
            }
        }

        found
    }

    /// Most recent anomaly events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AnomalyEvent> {
        self.history.lock().iter().take(limit).cloned().collect()
    }

    /// Window occupancy per sensor and field
    pub fn window_stats(&self) -> BTreeMap<String, BTreeMap<Field, usize>> {
        self.windows.occupancy()
    }

    pub fn tracked_windows(&self) -> usize {
        self.windows.tracked()
    }

    /// Drop windows idle past the configured timeout. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        match self.config.idle_window_timeout() {
            Some(timeout) => {
                let now = self.clock.now();
                let evicted = self.windows.evict_idle(now, timeout);
                self.cooldowns.prune(now);
                evicted
            }
            None => 0,
        }
    }

    fn remember(&self, event: AnomalyEvent) {
        let mut history = self.history.lock();
        history.push_front(event);
        history.truncate(self.config.history_capacity);
    }

    fn check(&self, sensor_id: &str, field: Field, value: f64) -> Option<AnomalyEvent> {
        let key = SensorKey::new(sensor_id, field);
        let now = self.clock.now();
        let snapshot = self.windows.ingest(&key, value, now);

        if snapshot.len() < self.config.min_window {
            return None;
        }

        let z_score = (snapshot.std > STD_EPSILON)
            .then(|| ((value - snapshot.mean) / snapshot.std).abs());
        let z_flag = z_score.is_some_and(|z| z > self.config.z_threshold);
        let iqr_flag = self.outside_fences(&snapshot, value);

        if !(z_flag || iqr_flag) {
            return None;
        }

        if !self.cooldowns.try_fire(key, now) {
            return None;
        }

        let severity = Severity::from_z_score(z_score);
        let message = self.build_message(sensor_id, field, value, &snapshot, z_score, iqr_flag);

        Some(AnomalyEvent {
            sensor_id: sensor_id.to_string(),
            field,
            value,
            z_score: z_score.map(|z| round_to(z, 3)),
            iqr_flag,
            mean: snapshot.mean,
            std: snapshot.std,
            severity,
            timestamp: now,
            message,
        })
    }

    fn outside_fences(&self, snapshot: &WindowSnapshot, value: f64) -> bool {
        if snapshot.len() < self.config.iqr_min_samples {
            return false;
        }
        let (q1, q3) = quartiles(&snapshot.history);
        let iqr = q3 - q1;
        let upper = q3 + self.config.iqr_multiplier * iqr;
        let lower = q1 - self.config.iqr_multiplier * iqr;
        value > upper || value < lower
    }

    fn build_message(
        &self,
        sensor_id: &str,
        field: Field,
        value: f64,
        snapshot: &WindowSnapshot,
        z_score: Option<f64>,
        iqr_flag: bool,
    ) -> String {
        let mut methods = Vec::new();
        if let Some(z) = z_score.filter(|z| *z > self.config.z_threshold) {
            methods.push(format!("Z-score={:.2}σ", z));
        }
        if iqr_flag {
            methods.push("IQR-fence".to_string());
        }
        format!(
            "Anomaly in '{}' on {}: observed {:.2} vs μ={:.2} σ={:.2}. Detection: {}.",
            field,
            sensor_id,
            value,
            snapshot.mean,
            snapshot.std,
            methods.join(", ")
        )
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
