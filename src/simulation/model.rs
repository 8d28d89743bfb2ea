use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What-if levers, each a percentage in [0, 100], plus optional baselines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationInput {
    pub traffic_reduction_pct: f64,
    pub ventilation_increase_pct: f64,
    pub industry_reduction_pct: f64,
    pub baseline_co2: Option<f64>,
    pub baseline_aqi: Option<f64>,
    pub baseline_risk: Option<f64>,
    pub baseline_temp: Option<f64>,
}

impl SimulationInput {
    pub fn new(traffic: f64, ventilation: f64, industry: f64) -> Self {
        Self {
            traffic_reduction_pct: traffic,
            ventilation_increase_pct: ventilation,
            industry_reduction_pct: industry,
            ..Self::default()
        }
    }

    pub fn with_baseline_co2(mut self, co2: f64) -> Self {
        self.baseline_co2 = Some(co2);
        self
    }

    pub fn with_baseline_aqi(mut self, aqi: f64) -> Self {
        self.baseline_aqi = Some(aqi);
        self
    }

    pub fn with_baseline_risk(mut self, risk: f64) -> Self {
        self.baseline_risk = Some(risk);
        self
    }

    pub fn with_baseline_temp(mut self, temp: f64) -> Self {
        self.baseline_temp = Some(temp);
        self
    }
}

/// Latest known values from the live system, any of which may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveBaseline {
    pub co2: Option<f64>,
    pub aqi: Option<f64>,
    pub risk: Option<f64>,
    pub temp: Option<f64>,
}

impl LiveBaseline {
    pub fn is_empty(&self) -> bool {
        self.co2.is_none() && self.aqi.is_none() && self.risk.is_none() && self.temp.is_none()
    }
}

/// City status after a simulated intervention.
///
/// Deliberately separate from [`crate::analytics::Severity`]: the rule engine
/// and the simulation classify on different scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Safe,
    Moderate,
    High,
    Critical,
}

impl AlertLevel {
    /// <30 SAFE, <55 MODERATE, <75 HIGH, otherwise CRITICAL
    pub fn from_risk(risk: f64) -> Self {
        if risk < 30.0 {
            AlertLevel::Safe
        } else if risk < 55.0 {
            AlertLevel::Moderate
        } else if risk < 75.0 {
            AlertLevel::High
        } else {
            AlertLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "SAFE",
            AlertLevel::Moderate => "MODERATE",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        }
    }

    /// Closing sentence of the impact summary
    pub fn narrative(&self) -> &'static str {
        match self {
            AlertLevel::Safe => {
                "City achieves SAFE status — outdoor activities are unrestricted."
            }
            AlertLevel::Moderate => {
                "City status: MODERATE — sensitive groups should still take precautions."
            }
            AlertLevel::High => {
                "City status remains HIGH — sustained action needed over multiple days."
            }
            AlertLevel::Critical => {
                "City status still CRITICAL — intervention scale is insufficient; escalate immediately."
            }
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub new_predicted_co2: f64,
    pub new_risk_score: f64,
    pub alert_level: AlertLevel,
    pub impact_summary: String,
    pub co2_reduction_ppm: f64,
    pub co2_reduction_pct: f64,
    pub risk_reduction: f64,
    pub traffic_co2_saved: f64,
    pub industry_co2_saved: f64,
    pub ventilation_co2_diluted: f64,
    pub baseline_co2: f64,
    pub baseline_risk: f64,
    pub timestamp: DateTime<Utc>,
}
