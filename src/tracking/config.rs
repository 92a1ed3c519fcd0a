use serde::{Deserialize, Serialize};

/// Tunable constants for smoothing and pace estimation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingConfig {
    /// Process noise per second; larger values trust new fixes sooner
    pub filter_decay: f64,

    /// Floor applied to reported accuracy (meters)
    pub min_accuracy_meters: f64,

    /// Number of instantaneous paces averaged per display update
    pub pace_window: usize,

    /// Oldest entries dropped after each emitted average
    pub pace_evict: usize,

    /// Pace stays hidden until the session has covered more than this
    pub pace_min_distance_km: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            filter_decay: 3.0,
            min_accuracy_meters: 1.0,
            pace_window: 25,
            pace_evict: 5,
            pace_min_distance_km: 0.08,
        }
    }
}
