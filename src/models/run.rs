use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SmoothedFix;

/// Positions recorded during one uninterrupted running interval.
///
/// Segments are built by the session while running and become read-only once
/// closed; there is no way to push onto a `TrackSegment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TrackSegment {
    points: Vec<SmoothedFix>,
}

impl TrackSegment {
    pub fn points(&self) -> &[SmoothedFix] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<SmoothedFix>> for TrackSegment {
    fn from(points: Vec<SmoothedFix>) -> Self {
        Self { points }
    }
}

/// A finished activity handed to the run store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub total_duration_seconds: u64,
    pub total_distance_km: f64,
    pub segments: Vec<TrackSegment>,
}

impl Run {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(TrackSegment::len).sum()
    }
}
