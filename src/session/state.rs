use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{RawFix, Run, SessionSnapshot, SmoothedFix, TrackSegment},
    tracking::{DistanceAccumulator, PaceEstimator, PaceReading, PositionFilter, TrackingConfig},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// Only observable while a finished run is being handed to the store.
    Finishing,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Running => "Running",
            SessionStatus::Paused => "Paused",
            SessionStatus::Finishing => "Finishing",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::Paused)
    }
}

/// Everything a session in progress owns.
///
/// Transition methods assume the caller has already checked that the
/// transition is legal for the current status.
#[derive(Debug, Clone)]
pub struct SessionContext {
    status: SessionStatus,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    elapsed_seconds: u64,
    segments: Vec<TrackSegment>,
    open_segment: Option<Vec<SmoothedFix>>,
    filter: PositionFilter,
    distance: DistanceAccumulator,
    pace: PaceEstimator,
    /// Progress made since the last snapshot was written.
    unsaved: bool,
}

impl SessionContext {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            started_at: None,
            elapsed_seconds: 0,
            segments: Vec::new(),
            open_segment: None,
            filter: PositionFilter::new(config.filter_decay, config.min_accuracy_meters),
            distance: DistanceAccumulator::new(),
            pace: PaceEstimator::from_config(config),
            unsaved: false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn total_distance_km(&self) -> f64 {
        self.distance.total_km()
    }

    /// Closed segments, oldest first.
    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn open_segment(&self) -> Option<&[SmoothedFix]> {
        self.open_segment.as_deref()
    }

    pub fn has_unsaved_progress(&self) -> bool {
        self.unsaved
    }

    pub fn filter(&self) -> &PositionFilter {
        &self.filter
    }

    /// Smooths a fix regardless of status; the marker follows the device even when idle.
    pub fn smooth(&mut self, fix: &RawFix) -> SmoothedFix {
        self.filter.process(
            fix.latitude,
            fix.longitude,
            fix.accuracy_meters,
            fix.timestamp_ms,
        )
    }

    /// Records a smoothed position while running. Returns `None` otherwise.
    pub fn record(&mut self, position: SmoothedFix, speed: Option<f64>) -> Option<PaceReading> {
        if self.status != SessionStatus::Running {
            return None;
        }

        self.open_segment
            .get_or_insert_with(Vec::new)
            .push(position);
        self.distance.push(position);
        self.unsaved = true;

        Some(self.pace.observe(speed, self.distance.total_km()))
    }

    pub fn begin(&mut self, session_id: String, started_at: DateTime<Utc>) {
        self.status = SessionStatus::Running;
        self.session_id = Some(session_id);
        self.started_at = Some(started_at);
        self.elapsed_seconds = 0;
        self.segments.clear();
        self.open_segment = Some(Vec::new());
        self.distance.reset();
        self.pace.reset();
        self.unsaved = true;
    }

    pub fn pause(&mut self) {
        self.close_segment();
        self.status = SessionStatus::Paused;
        self.unsaved = true;
    }

    pub fn resume(&mut self) {
        self.status = SessionStatus::Running;
        self.open_segment = Some(Vec::new());
        self.distance.reset_segment();
        self.unsaved = true;
    }

    pub fn tick(&mut self) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.elapsed_seconds += 1;
        self.unsaved = true;
        true
    }

    /// Moves the open segment, if any, onto the closed list.
    pub fn close_segment(&mut self) -> bool {
        match self.open_segment.take() {
            Some(points) => {
                self.segments.push(TrackSegment::from(points));
                true
            }
            None => false,
        }
    }

    /// Closes the session and hands back the finished run when any distance was covered.
    ///
    /// Leaves the context in `Finishing`; call [`SessionContext::reset`] once the run
    /// has been dealt with.
    pub fn finish(&mut self, run_id: String) -> Option<Run> {
        self.close_segment();
        self.status = SessionStatus::Finishing;

        let total_distance_km = self.distance.total_km();
        // NaN distance counts as none.
        if total_distance_km.is_nan() || total_distance_km <= 0.0 {
            return None;
        }

        Some(Run {
            id: run_id,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            total_duration_seconds: self.elapsed_seconds,
            total_distance_km,
            segments: std::mem::take(&mut self.segments),
        })
    }

    /// Back to idle with a fresh filter and zeroed accumulators.
    pub fn reset(&mut self, config: &TrackingConfig) {
        *self = Self::new(config);
    }

    /// Captures the session for recovery, closing the open segment first.
    pub fn snapshot(&mut self) -> Option<SessionSnapshot> {
        if !self.status.is_active() {
            return None;
        }
        self.close_segment();

        Some(SessionSnapshot {
            session_id: self.session_id.clone()?,
            started_at: self.started_at?,
            elapsed_seconds: self.elapsed_seconds,
            total_distance_km: self.distance.total_km(),
            segments: self.segments.clone(),
            session_state: self.status,
        })
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    /// Rebuilds a paused session from a snapshot. The filter starts over.
    pub fn restore(&mut self, snapshot: SessionSnapshot, config: &TrackingConfig) {
        *self = Self::new(config);
        self.status = SessionStatus::Paused;
        self.session_id = Some(snapshot.session_id);
        self.started_at = Some(snapshot.started_at);
        self.elapsed_seconds = snapshot.elapsed_seconds;
        self.segments = snapshot.segments;
        self.distance = DistanceAccumulator::resume_from(snapshot.total_distance_km);
        // Restored from the snapshot that was just consumed; nothing is on disk any more.
        self.unsaved = true;
    }
}
