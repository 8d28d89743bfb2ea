//! Sources of live baseline values for simulations.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::GreenflowResult;
use crate::simulation::model::LiveBaseline;
use crate::telemetry::{Field, Readings};

/// Provider of the latest known CO₂/AQI/risk/temperature values
#[async_trait]
pub trait BaselineSource: Send + Sync {
    async fn latest(&self) -> GreenflowResult<LiveBaseline>;
}

/// Baseline built from the most recent value seen for each field
#[derive(Debug, Default)]
pub struct LatestReadings {
    latest: Mutex<LiveBaseline>,
}

impl LatestReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the finite values of a reading
    pub fn observe(&self, readings: &Readings) {
        let mut latest = self.latest.lock();
        for (&field, &value) in readings {
            if !value.is_finite() {
                continue;
            }
            match field {
                Field::Co2Ppm => latest.co2 = Some(value),
                Field::Aqi => latest.aqi = Some(value),
                Field::RiskScore => latest.risk = Some(value),
                Field::TemperatureC => latest.temp = Some(value),
                Field::CarbonScore | Field::Humidity => {}
            }
        }
    }

    pub fn snapshot(&self) -> LiveBaseline {
        *self.latest.lock()
    }
}

#[async_trait]
impl BaselineSource for LatestReadings {
    async fn latest(&self) -> GreenflowResult<LiveBaseline> {
        Ok(self.snapshot())
    }
}
