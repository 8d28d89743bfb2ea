use serde::{Deserialize, Serialize};

use crate::analytics::AnomalyDetector;
use crate::sink::AlertDispatcher;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub detail: String,
}

/// Verify the detector answers and report how much state it holds.
///
/// Reports `degraded` once the number of tracked windows passes
/// `window_budget`, which usually means idle eviction is off or too lax.
pub fn check_anomaly_detector(detector: &AnomalyDetector, window_budget: usize) -> ComponentHealth {
    let stats = detector.window_stats();
    let sensors = stats.len();
    let windows: usize = stats.values().map(|fields| fields.len()).sum();

    let status = if windows > window_budget {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };

    ComponentHealth {
        name: "anomaly_detector".to_string(),
        status,
        detail: format!("{} sensors tracked across {} windows", sensors, windows),
    }
}

/// Report whether alerts still reach persistence.
///
/// `failed` once the drain task has exited, `degraded` when batches have
/// been dropped on a full queue.
pub fn check_alert_dispatcher(dispatcher: &AlertDispatcher) -> ComponentHealth {
    let dropped = dispatcher.dropped_batches();
    let (status, detail) = if !dispatcher.is_running() {
        (
            HealthStatus::Failed,
            format!("persistence worker stopped, {} batch(es) dropped", dropped),
        )
    } else if dropped > 0 {
        (
            HealthStatus::Degraded,
            format!("{} batch(es) dropped on a full queue", dropped),
        )
    } else {
        (HealthStatus::Ok, "persistence worker running".to_string())
    };

    ComponentHealth {
        name: "alert_dispatcher".to_string(),
        status,
        detail,
    }
}
