use serde::{Deserialize, Serialize};

/// One sample delivered by the location watch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    #[serde(default)]
    pub speed_meters_per_second: Option<f64>,
    pub timestamp_ms: i64,
}

impl RawFix {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            speed_meters_per_second: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed_meters_per_second = Some(speed);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SmoothedFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl SmoothedFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
