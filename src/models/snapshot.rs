use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TrackSegment;
use crate::session::SessionStatus;

/// In-flight session state written when the app is backgrounded.
///
/// `segments` only ever holds closed segments; the open one is closed before a
/// snapshot is taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub total_distance_km: f64,
    pub segments: Vec<TrackSegment>,
    pub session_state: SessionStatus,
}
