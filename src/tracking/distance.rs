use crate::models::SmoothedFix;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers.
pub fn haversine_km(from: &SmoothedFix, to: &SmoothedFix) -> f64 {
    let p = std::f64::consts::PI / 180.0;
    let a = 0.5 - ((to.latitude - from.latitude) * p).cos() / 2.0
        + (from.latitude * p).cos()
            * (to.latitude * p).cos()
            * (1.0 - ((to.longitude - from.longitude) * p).cos())
            / 2.0;

    // Rounding can push `a` a hair outside [0, 1] for coincident or antipodal points.
    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Distance charged between two consecutive positions of a segment.
pub fn accumulate(previous: Option<&SmoothedFix>, current: &SmoothedFix) -> f64 {
    match previous {
        Some(previous) => haversine_km(previous, current),
        None => 0.0,
    }
}

/// Running distance total over every segment of a session.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    previous: Option<SmoothedFix>,
    total_km: f64,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from a total recorded earlier, at a fresh segment boundary.
    pub fn resume_from(total_km: f64) -> Self {
        Self {
            previous: None,
            total_km,
        }
    }

    /// Charges the distance from the previous position and returns the delta.
    pub fn push(&mut self, current: SmoothedFix) -> f64 {
        let delta = accumulate(self.previous.as_ref(), &current);
        self.total_km += delta;
        self.previous = Some(current);
        delta
    }

    /// Forget the adjacency so the next position starts a new segment.
    pub fn reset_segment(&mut self) {
        self.previous = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Vec<SmoothedFix> {
        vec![
            SmoothedFix::new(55.9533, -3.1883),
            SmoothedFix::new(55.9540, -3.1870),
            SmoothedFix::new(55.9551, -3.1862),
            SmoothedFix::new(55.9560, -3.1849),
            SmoothedFix::new(55.9562, -3.1830),
        ]
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude along a meridian.
        let a = SmoothedFix::new(0.0, 0.0);
        let b = SmoothedFix::new(1.0, 0.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = SmoothedFix::new(48.8566, 2.3522);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn segment_start_charges_nothing() {
        let p = SmoothedFix::new(10.0, 10.0);
        assert_eq!(accumulate(None, &p), 0.0);

        let mut acc = DistanceAccumulator::new();
        assert_eq!(acc.push(p), 0.0);
        assert_eq!(acc.total_km(), 0.0);
    }

    #[test]
    fn pushed_deltas_sum_to_pairwise_haversine() {
        let points = track();
        let mut acc = DistanceAccumulator::new();
        let sum_of_deltas: f64 = points.iter().map(|p| acc.push(*p)).sum();

        let pairwise: f64 = points
            .windows(2)
            .map(|pair| haversine_km(&pair[0], &pair[1]))
            .sum();

        assert!((sum_of_deltas - pairwise).abs() < 1e-12);
        assert!((acc.total_km() - pairwise).abs() < 1e-12);
    }

    #[test]
    fn segment_boundary_skips_the_gap() {
        let points = track();
        let mut acc = DistanceAccumulator::new();
        acc.push(points[0]);
        acc.push(points[1]);
        let after_first = acc.total_km();

        acc.reset_segment();
        assert_eq!(acc.push(points[4]), 0.0);
        assert_eq!(acc.total_km(), after_first);

        acc.push(points[3]);
        assert!(acc.total_km() > after_first);
    }

    #[test]
    fn resume_keeps_total_but_not_adjacency() {
        let mut acc = DistanceAccumulator::resume_from(1.25);
        assert_eq!(acc.push(SmoothedFix::new(1.0, 1.0)), 0.0);
        assert_eq!(acc.total_km(), 1.25);
    }
}
