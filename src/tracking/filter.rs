use crate::models::SmoothedFix;

/// Smallest accuracy floor a filter accepts, whatever the configuration says.
pub const ACCURACY_FLOOR_METERS: f64 = 0.01;

/// Scalar-variance Kalman smoother over latitude/longitude.
///
/// A single variance is shared by both axes. It grows with the time elapsed
/// between fixes (`decay² · dt / 1000`) and shrinks by `1 - k` after every
/// update, where `k` weighs the prior estimate against the fix's reported
/// accuracy.
#[derive(Debug, Clone)]
pub struct PositionFilter {
    decay: f64,
    min_accuracy: f64,
    state: Option<FilterState>,
}

#[derive(Debug, Clone, Copy)]
struct FilterState {
    latitude: f64,
    longitude: f64,
    variance: f64,
    timestamp_ms: i64,
}

impl PositionFilter {
    /// `min_accuracy` is raised to [`ACCURACY_FLOOR_METERS`] so the gain denominator
    /// can never be zero.
    pub fn new(decay: f64, min_accuracy: f64) -> Self {
        let min_accuracy = if min_accuracy.is_finite() {
            min_accuracy.max(ACCURACY_FLOOR_METERS)
        } else {
            ACCURACY_FLOOR_METERS
        };

        Self {
            decay,
            min_accuracy,
            state: None,
        }
    }

    pub fn process(
        &mut self,
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        timestamp_ms: i64,
    ) -> SmoothedFix {
        let accuracy = self.clamp_accuracy(accuracy_meters);
        let measurement_variance = accuracy * accuracy;

        let Some(state) = self.state.as_mut() else {
            self.state = Some(FilterState {
                latitude,
                longitude,
                variance: measurement_variance,
                timestamp_ms,
            });
            return SmoothedFix::new(latitude, longitude);
        };

        let dt = timestamp_ms - state.timestamp_ms;
        if dt > 0 {
            state.variance += dt as f64 * self.decay * self.decay / 1000.0;
            state.timestamp_ms = timestamp_ms;
        }

        let gain = state.variance / (state.variance + measurement_variance);
        state.latitude += gain * (latitude - state.latitude);
        state.longitude += gain * (longitude - state.longitude);
        state.variance *= 1.0 - gain;

        SmoothedFix::new(state.latitude, state.longitude)
    }

    /// Current variance, or `None` before the first fix.
    pub fn variance(&self) -> Option<f64> {
        self.state.map(|state| state.variance)
    }

    pub fn estimate(&self) -> Option<SmoothedFix> {
        self.state
            .map(|state| SmoothedFix::new(state.latitude, state.longitude))
    }

    pub fn reset(&mut self) {
        self.state = None;
    }

    fn clamp_accuracy(&self, accuracy: f64) -> f64 {
        // NaN fails the comparison and lands on the floor too.
        if accuracy >= self.min_accuracy {
            accuracy
        } else {
            self.min_accuracy
        }
    }
}
