//! Deterministic what-if model for city-level interventions.
//!
//! Three levers are modelled: traffic reduction, ventilation increase and
//! industrial cutback. Each lever goes through a diminishing-returns curve,
//! so the last ten percent of an intervention buys less than the first.
//!
//! CO₂ follows urban emission shares: traffic 27%, industry 33%, with
//! buildings (24%) and other sources (16%) out of reach of these levers.
//! Ventilation cuts no emissions. It dilutes the measured local concentration
//! and is capped at 30%. AQI follows its own co-reduction coefficients, and
//! risk is recomposed from the new CO₂, the new AQI and the unchanged
//! temperature.
//!
//! The constants are calibrated and the outputs are compared against stored
//! values, so changing any of them changes results downstream.

use chrono::{DateTime, Utc};
use log::info;

use crate::analytics::stats::round_to;
use crate::simulation::model::{AlertLevel, LiveBaseline, SimulationInput, SimulationResult};

// Emission source shares (urban average)
pub const TRAFFIC_CO2_SHARE: f64 = 0.27;
pub const INDUSTRY_CO2_SHARE: f64 = 0.33;
pub const BUILDING_CO2_SHARE: f64 = 0.24;
pub const OTHER_CO2_SHARE: f64 = 0.16;

pub const MAX_VENTILATION_DILUTION: f64 = 0.30;

// Diminishing-returns steepness per lever
pub const TRAFFIC_STEEPNESS: f64 = 1.6;
pub const VENTILATION_STEEPNESS: f64 = 1.2;
pub const INDUSTRY_STEEPNESS: f64 = 1.8;

// AQI co-reduction per unit of effective intervention
pub const TRAFFIC_AQI_COEFF: f64 = 0.35;
pub const INDUSTRY_AQI_COEFF: f64 = 0.40;
pub const VENTILATION_AQI_COEFF: f64 = 0.20;

// Risk composition
pub const WEIGHT_CO2: f64 = 0.55;
pub const WEIGHT_AQI: f64 = 0.25;
pub const WEIGHT_TEMP: f64 = 0.20;

const CO2_BAND: (f64, f64) = (400.0, 1000.0);
const AQI_BAND: (f64, f64) = (50.0, 300.0);
const TEMP_BAND: (f64, f64) = (25.0, 45.0);

/// Physical floors
pub const MIN_CO2_PPM: f64 = 300.0;
pub const MIN_AQI: f64 = 10.0;

// Fallback baselines when neither an override nor a live value is usable
pub const DEFAULT_CO2: f64 = 420.0;
pub const DEFAULT_AQI: f64 = 85.0;
pub const DEFAULT_RISK: f64 = 45.0;
pub const DEFAULT_TEMP: f64 = 28.0;

/// Effective reduction for an intervention `fraction` in [0, 1]:
/// `1 - e^(-steepness * fraction)`
pub fn effective(fraction: f64, steepness: f64) -> f64 {
    if fraction <= 0.0 {
        return 0.0;
    }
    1.0 - (-steepness * fraction).exp()
}

fn lever_fraction(pct: f64) -> f64 {
    if !pct.is_finite() {
        return 0.0;
    }
    pct.clamp(0.0, 100.0) / 100.0
}

fn normalize(value: f64, (low, high): (f64, f64)) -> f64 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Usable as a concentration/index baseline: finite and positive
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Baselines after resolving overrides, live values and defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBaseline {
    pub co2: f64,
    pub aqi: f64,
    pub risk: f64,
    pub temp: f64,
}

impl ResolvedBaseline {
    /// Override first, then the live value, then the default.
    ///
    /// CO₂, AQI and risk must be finite and positive to count; temperature
    /// only has to be finite.
    pub fn resolve(input: &SimulationInput, live: &LiveBaseline) -> Self {
        Self {
            co2: positive(input.baseline_co2)
                .or(positive(live.co2))
                .unwrap_or(DEFAULT_CO2),
            aqi: positive(input.baseline_aqi)
                .or(positive(live.aqi))
                .unwrap_or(DEFAULT_AQI),
            risk: positive(input.baseline_risk)
                .or(positive(live.risk))
                .unwrap_or(DEFAULT_RISK),
            temp: finite(input.baseline_temp)
                .or(finite(live.temp))
                .unwrap_or(DEFAULT_TEMP),
        }
    }
}

/// Per-lever CO₂ effects, before rounding
#[derive(Debug, Clone, Copy)]
struct LeverEffects {
    traffic_saved: f64,
    industry_saved: f64,
    ventilation_diluted: f64,
    traffic_active: bool,
    industry_active: bool,
    ventilation_active: bool,
}

impl LeverEffects {
    fn total(&self) -> f64 {
        self.traffic_saved + self.industry_saved + self.ventilation_diluted
    }
}

/// Stateless simulation engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationEngine;

impl SimulationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run one simulation stamped with the current time
    pub fn simulate(&self, input: &SimulationInput, live: &LiveBaseline) -> SimulationResult {
        self.simulate_at(input, live, Utc::now())
    }

    /// Run one simulation with an explicit timestamp
    pub fn simulate_at(
        &self,
        input: &SimulationInput,
        live: &LiveBaseline,
        timestamp: DateTime<Utc>,
    ) -> SimulationResult {
        let base = ResolvedBaseline::resolve(input, live);

        let t = lever_fraction(input.traffic_reduction_pct);
        let v = lever_fraction(input.ventilation_increase_pct);
        let i = lever_fraction(input.industry_reduction_pct);

        let eff_t = effective(t, TRAFFIC_STEEPNESS);
        let eff_v = effective(v, VENTILATION_STEEPNESS);
        let eff_i = effective(i, INDUSTRY_STEEPNESS);

        // CO₂
        let effects = LeverEffects {
            traffic_saved: base.co2 * TRAFFIC_CO2_SHARE * eff_t,
            industry_saved: base.co2 * INDUSTRY_CO2_SHARE * eff_i,
            ventilation_diluted: base.co2 * eff_v.min(MAX_VENTILATION_DILUTION),
            traffic_active: t > 0.0,
            industry_active: i > 0.0,
            ventilation_active: v > 0.0,
        };
        let total_reduction = effects.total();
        let new_co2 = (base.co2 - total_reduction).max(MIN_CO2_PPM);

        // AQI
        let aqi_reduction = base.aqi * TRAFFIC_AQI_COEFF * eff_t
            + base.aqi * INDUSTRY_AQI_COEFF * eff_i
            + base.aqi * VENTILATION_AQI_COEFF * eff_v;
        let new_aqi = (base.aqi - aqi_reduction).max(MIN_AQI);

        // Risk, recomposed even when no lever moved
        let raw_risk = (normalize(new_co2, CO2_BAND) * WEIGHT_CO2
            + normalize(new_aqi, AQI_BAND) * WEIGHT_AQI
            + normalize(base.temp, TEMP_BAND) * WEIGHT_TEMP)
            * 100.0;
        let new_risk = round_to(raw_risk.clamp(0.0, 100.0), 2);

        let alert_level = AlertLevel::from_risk(new_risk);
        let co2_delta_pct = total_reduction / base.co2 * 100.0;
        let risk_delta = base.risk - new_risk;

        let impact_summary = build_summary(
            &base,
            new_co2,
            new_risk,
            alert_level,
            co2_delta_pct,
            risk_delta,
            &effects,
        );

        info!(
            "Simulation | CO₂: {:.1}→{:.1} ppm | Risk: {:.1}→{:.1} | Alert: {}",
            base.co2, new_co2, base.risk, new_risk, alert_level
        );

        SimulationResult {
            new_predicted_co2: round_to(new_co2, 2),
            new_risk_score: new_risk,
            alert_level,
            impact_summary,
            co2_reduction_ppm: round_to(total_reduction, 2),
            co2_reduction_pct: round_to(co2_delta_pct, 1),
            risk_reduction: round_to(risk_delta, 2),
            traffic_co2_saved: round_to(effects.traffic_saved, 2),
            industry_co2_saved: round_to(effects.industry_saved, 2),
            ventilation_co2_diluted: round_to(effects.ventilation_diluted, 2),
            baseline_co2: round_to(base.co2, 2),
            baseline_risk: round_to(base.risk, 2),
            timestamp,
        }
    }
}

fn build_summary(
    base: &ResolvedBaseline,
    new_co2: f64,
    new_risk: f64,
    alert_level: AlertLevel,
    co2_delta_pct: f64,
    risk_delta: f64,
    effects: &LeverEffects,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    // Headline
    if co2_delta_pct >= 15.0 {
        parts.push(format!(
            "Significant improvement: {:.1}% CO₂ reduction achieved.",
            co2_delta_pct
        ));
    } else if co2_delta_pct >= 5.0 {
        parts.push(format!(
            "Meaningful reduction: {:.1}% CO₂ cut projected.",
            co2_delta_pct
        ));
    } else if co2_delta_pct > 0.0 {
        parts.push(format!(
            "Marginal improvement: {:.1}% CO₂ reduction possible.",
            co2_delta_pct
        ));
    } else {
        parts.push("No meaningful interventions applied.".to_string());
    }

    // Source breakdown
    let mut sources = Vec::new();
    if effects.traffic_active {
        sources.push(format!("traffic reduction (-{:.1} ppm)", effects.traffic_saved));
    }
    if effects.industry_active {
        sources.push(format!("industrial cutback (-{:.1} ppm)", effects.industry_saved));
    }
    if effects.ventilation_active {
        sources.push(format!(
            "ventilation boost (-{:.1} ppm dilution)",
            effects.ventilation_diluted
        ));
    }
    if !sources.is_empty() {
        parts.push(format!("Breakdown: {}.", sources.join(", ")));
    }

    parts.push(format!(
        "CO₂ moves from {:.1} → {:.1} ppm (saving {:.1} ppm).",
        base.co2,
        new_co2,
        base.co2 - new_co2
    ));

    let (direction, tally) = if risk_delta > 0.0 {
        ("improved", "gained")
    } else {
        ("unchanged", "net")
    };
    parts.push(format!(
        "Risk score {} from {:.1} → {:.1} ({:.1} pts {}).",
        direction,
        base.risk,
        new_risk,
        risk_delta.abs(),
        tally
    ));

    parts.push(alert_level.narrative().to_string());

    parts.join(" ")
}
