use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

/// A single appliance-level electricity reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawReading {
    pub timestamp: NaiveDateTime,
    pub usage_kwh: f64,
    pub appliance: Option<String>,
    pub room: Option<String>,
    pub temperature_c: Option<f64>,
    pub cost: Option<f64>,
}

impl RawReading {
    /// Reading with only the required fields set.
    pub fn new(timestamp: NaiveDateTime, usage_kwh: f64) -> Self {
        Self {
            timestamp,
            usage_kwh,
            appliance: None,
            room: None,
            temperature_c: None,
            cost: None,
        }
    }

    pub fn with_appliance(mut self, appliance: impl Into<String>) -> Self {
        self.appliance = Some(appliance.into());
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_temperature(mut self, temperature_c: f64) -> Self {
        self.temperature_c = Some(temperature_c);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Calendar date of the reading; time of day is discarded.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Timestamp truncated to the start of its hour.
    pub fn hour_start(&self) -> NaiveDateTime {
        self.timestamp
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(self.timestamp)
    }
}
