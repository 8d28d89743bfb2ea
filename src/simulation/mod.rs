//! What-if policy simulation.

pub mod baseline;
pub mod engine;
pub mod model;

pub use baseline::{BaselineSource, LatestReadings};
pub use engine::{ResolvedBaseline, SimulationEngine, effective};
pub use model::{AlertLevel, LiveBaseline, SimulationInput, SimulationResult};

use log::warn;

/// Fetch live baselines from `source` and run a simulation.
///
/// A failing source is not fatal; the run falls back to overrides and
/// defaults.
pub async fn simulate_live(
    engine: &SimulationEngine,
    input: &SimulationInput,
    source: &dyn BaselineSource,
) -> SimulationResult {
    let live = match source.latest().await {
        Ok(live) => live,
        Err(e) => {
            warn!("Baseline fetch failed during simulation, using defaults: {}", e);
            LiveBaseline::default()
        }
    };
    engine.simulate(input, &live)
}
