//! Static threshold rules.
//!
//! Every rule maps one telemetry field to four ascending bounds. A value at or
//! above a bound earns that bound's severity; the highest bound met wins.

use serde::{Deserialize, Serialize};

use crate::analytics::severity::Severity;
use crate::error::{GreenflowError, GreenflowResult};
use crate::telemetry::Field;

/// One row of the threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub field: Field,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
    pub alert_type: String,
    #[serde(default)]
    pub unit: String,
}

impl ThresholdRule {
    pub fn new(
        field: Field,
        bounds: [f64; 4],
        alert_type: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        let [low, medium, high, critical] = bounds;
        Self {
            field,
            low,
            medium,
            high,
            critical,
            alert_type: alert_type.into(),
            unit: unit.into(),
        }
    }

    pub fn bounds(&self) -> [f64; 4] {
        [self.low, self.medium, self.high, self.critical]
    }

    /// Check that all bounds are finite and strictly increasing
    pub fn validate(&self) -> GreenflowResult<()> {
        let bounds = self.bounds();
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(self.invalid("bounds must be finite"));
        }
        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(self.invalid("bounds must be strictly increasing"));
        }
        if self.alert_type.trim().is_empty() {
            return Err(self.invalid("alert_type cannot be empty"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> GreenflowError {
        GreenflowError::InvalidRule {
            rule: format!("{}:{}", self.field, self.alert_type),
            reason: reason.to_string(),
        }
    }
}

/// Rules shipped with the engine
pub fn default_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::new(Field::Co2Ppm, [600.0, 700.0, 800.0, 950.0], "CO2_HIGH", "ppm"),
        ThresholdRule::new(Field::Aqi, [100.0, 150.0, 200.0, 300.0], "AQI_HIGH", "AQI"),
        ThresholdRule::new(Field::RiskScore, [50.0, 60.0, 70.0, 85.0], "RISK_HIGH", "%"),
        ThresholdRule::new(Field::TemperatureC, [35.0, 38.0, 40.0, 45.0], "HEAT_HIGH", "°C"),
        ThresholdRule::new(Field::CarbonScore, [0.7, 0.8, 0.9, 0.95], "CARBON_HIGH", ""),
    ]
}

/// Validated, immutable rule table
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    rules: Vec<ThresholdRule>,
}

impl ThresholdEvaluator {
    /// Build an evaluator, rejecting the whole table if any rule is invalid
    pub fn new(rules: Vec<ThresholdRule>) -> GreenflowResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Highest severity whose bound `value` meets (inclusive)
    pub fn classify(rule: &ThresholdRule, value: f64) -> Option<Severity> {
        if value >= rule.critical {
            Some(Severity::Critical)
        } else if value >= rule.high {
            Some(Severity::High)
        } else if value >= rule.medium {
            Some(Severity::Medium)
        } else if value >= rule.low {
            Some(Severity::Low)
        } else {
            None
        }
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}
