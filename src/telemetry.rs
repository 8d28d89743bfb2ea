//! Normalized telemetry as it reaches the analytics core.
//!
//! Ingestion connectors are expected to hand over [`Reading`] values. The set
//! of field names is closed: anything outside [`Field`] is rejected when a
//! reading is decoded, so the detector and the alert engine never see
//! free-form keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::GreenflowError;

/// Known telemetry fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Co2Ppm,
    Aqi,
    RiskScore,
    TemperatureC,
    CarbonScore,
    Humidity,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Co2Ppm,
        Field::Aqi,
        Field::RiskScore,
        Field::TemperatureC,
        Field::CarbonScore,
        Field::Humidity,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Co2Ppm => "co2_ppm",
            Field::Aqi => "aqi",
            Field::RiskScore => "risk_score",
            Field::TemperatureC => "temperature_c",
            Field::CarbonScore => "carbon_score",
            Field::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = GreenflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| GreenflowError::UnknownField(s.to_string()))
    }
}

/// Field values carried by one reading
pub type Readings = BTreeMap<Field, f64>;

/// Identity of a per-sensor, per-field series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorKey {
    pub sensor_id: String,
    pub field: Field,
}

impl SensorKey {
    pub fn new(sensor_id: impl Into<String>, field: Field) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            field,
        }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sensor_id, self.field)
    }
}

/// A single normalized observation from one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub values: Readings,
}

impl Reading {
    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            city: None,
            timestamp: Utc::now(),
            values: Readings::new(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_value(mut self, field: Field, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }

    /// Decode one JSON document, rejecting unknown field names
    pub fn from_json(line: &str) -> Result<Self, GreenflowError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Build a reading from loosely keyed values, as connectors produce them.
    pub fn from_raw<'a, I>(sensor_id: impl Into<String>, raw: I) -> Result<Self, GreenflowError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut reading = Reading::new(sensor_id);
        for (name, value) in raw {
            let field: Field = name.parse()?;
            reading.values.insert(field, value);
        }
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trips_through_wire_name() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert!(matches!(
            "pm25".parse::<Field>(),
            Err(GreenflowError::UnknownField(name)) if name == "pm25"
        ));
    }

    #[test]
    fn test_reading_json_rejects_unknown_fields() {
        let ok = r#"{"sensor_id":"s1","city":"Delhi","values":{"co2_ppm":812.5,"aqi":140}}"#;
        let reading = Reading::from_json(ok).unwrap();
        assert_eq!(reading.city.as_deref(), Some("Delhi"));
        assert_eq!(reading.values[&Field::Co2Ppm], 812.5);
        assert_eq!(reading.values[&Field::Aqi], 140.0);

        let bad = r#"{"sensor_id":"s1","values":{"pm25":12.0}}"#;
        assert!(Reading::from_json(bad).is_err());
    }

    #[test]
    fn test_from_raw_validates_names() {
        let reading = Reading::from_raw("s2", [("temperature_c", 31.0)]).unwrap();
        assert_eq!(reading.values.len(), 1);
        assert!(Reading::from_raw("s2", [("wind", 3.0)]).is_err());
    }
}
