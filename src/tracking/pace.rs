use std::collections::VecDeque;

use serde::Serialize;

use super::TrackingConfig;

/// Result of feeding one speed reading to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "secondsPerKm")]
pub enum PaceReading {
    /// The fix carried no speed.
    Unavailable,
    /// No new average this observation.
    Pending,
    Value(f64),
    /// The averaged window was stationary.
    Infinite,
}

/// Sliding-window average of instantaneous pace.
///
/// An average is only emitted when the window is full and the session has
/// covered enough ground. After each emission the oldest `evict` entries are
/// dropped, so consecutive averages share most of their samples.
#[derive(Debug, Clone)]
pub struct PaceEstimator {
    window: VecDeque<f64>,
    capacity: usize,
    evict: usize,
    min_distance_km: f64,
}

impl PaceEstimator {
    pub fn new(capacity: usize, evict: usize, min_distance_km: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            evict: evict.clamp(1, capacity),
            min_distance_km,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(
            config.pace_window,
            config.pace_evict,
            config.pace_min_distance_km,
        )
    }

    pub fn observe(&mut self, speed: Option<f64>, cumulative_distance_km: f64) -> PaceReading {
        let Some(speed) = speed else {
            return PaceReading::Unavailable;
        };

        let pace = if speed > 0.0 { 1000.0 / speed } else { 0.0 };
        self.window.push_back(pace);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        if self.window.len() < self.capacity || cumulative_distance_km <= self.min_distance_km {
            return PaceReading::Pending;
        }

        let average = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.window.drain(..self.evict);

        if average > 0.0 {
            PaceReading::Value(average)
        } else {
            PaceReading::Infinite
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
