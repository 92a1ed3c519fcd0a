use serde::Serialize;
use tokio::sync::oneshot;

use super::SessionStatus;
use crate::{error::SensorError, models::RawFix, tracking::PaceReading};

/// Everything the session reacts to, consumed one at a time.
#[derive(Debug)]
pub enum SessionEvent {
    FixReceived(RawFix),
    LocationFailed(SensorError),
    PermissionRestored,
    Tick { generation: u64 },
    Start,
    Pause,
    Continue,
    Finish,
    Backgrounded,
    Foregrounded,
    /// Startup: pick up a snapshot left by an interrupted session.
    Restored,
    Inspect(oneshot::Sender<SessionView>),
    Shutdown,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::FixReceived(_) => "fix",
            SessionEvent::LocationFailed(_) => "location-failed",
            SessionEvent::PermissionRestored => "permission-restored",
            SessionEvent::Tick { .. } => "tick",
            SessionEvent::Start => "start",
            SessionEvent::Pause => "pause",
            SessionEvent::Continue => "continue",
            SessionEvent::Finish => "finish",
            SessionEvent::Backgrounded => "backgrounded",
            SessionEvent::Foregrounded => "foregrounded",
            SessionEvent::Restored => "restored",
            SessionEvent::Inspect(_) => "inspect",
            SessionEvent::Shutdown => "shutdown",
        }
    }

    /// High-frequency events that are not worth a log line each.
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            SessionEvent::Tick { .. } | SessionEvent::FixReceived(_)
        )
    }
}

/// Read-only view of the session for callers outside the event loop.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub elapsed_seconds: u64,
    pub total_distance_km: f64,
    pub segment_count: usize,
    pub open_segment_points: Option<usize>,
    pub pace: PaceReading,
    pub location_blocked: bool,
    pub ticker_running: bool,
}
