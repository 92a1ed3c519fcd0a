use log::{info, warn};
use serde::Serialize;

use crate::{
    error::SensorError,
    models::SmoothedFix,
    session::SessionStatus,
    tracking::PaceReading,
};

pub const PACE_PENDING: &str = "--:--/km";
pub const PACE_INFINITE: &str = "∞/km";

/// Which session buttons should be visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub start: bool,
    pub pause: bool,
    pub resume: bool,
    pub finish: bool,
}

impl Controls {
    pub fn for_status(status: SessionStatus, location_blocked: bool) -> Self {
        match status {
            SessionStatus::Idle => Self {
                start: !location_blocked,
                ..Self::default()
            },
            SessionStatus::Running => Self {
                pause: true,
                finish: true,
                ..Self::default()
            },
            SessionStatus::Paused => Self {
                resume: !location_blocked,
                finish: true,
                ..Self::default()
            },
            SessionStatus::Finishing => Self::default(),
        }
    }
}

/// Messages for the user-facing error channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum UserNotice {
    Location { error: SensorError },
    RunSaveFailed { reason: String },
    SnapshotFailed { reason: String },
}

impl UserNotice {
    pub fn message(&self) -> String {
        match self {
            UserNotice::Location {
                error: SensorError::PermissionDenied,
            } => "Location access was denied. Allow location access to track runs.".into(),
            UserNotice::Location {
                error: SensorError::PositionUnavailable,
            } => "Your position is currently unavailable. Still trying...".into(),
            UserNotice::Location {
                error: SensorError::Timeout,
            } => "Finding your location is taking longer than usual. Still trying...".into(),
            UserNotice::RunSaveFailed { reason } => {
                format!("Your run could not be saved: {reason}")
            }
            UserNotice::SnapshotFailed { reason } => {
                format!("Your in-progress run could not be preserved: {reason}")
            }
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, UserNotice::Location { error } if error.is_fatal())
    }
}

/// Write-only surface the session pushes its readouts to.
pub trait DisplaySink: Send {
    fn show_marker(&mut self, position: SmoothedFix);
    fn show_duration(&mut self, text: &str);
    fn show_distance(&mut self, text: &str);
    fn show_pace(&mut self, text: &str);
    fn show_controls(&mut self, controls: Controls);
    fn report(&mut self, notice: &UserNotice);
}

/// `HH:MM:SS`; hours keep counting past 99.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn format_distance(km: f64) -> String {
    format!("{km:.2}")
}

/// Seconds rounded to the nearest whole second, shown as `MM:SS`.
pub fn format_min_sec(seconds: f64) -> String {
    let rounded = seconds.round().max(0.0) as u64;
    format!("{:02}:{:02}", rounded / 60, rounded % 60)
}

/// Text for a pace reading, or `None` when the display should keep what it shows.
pub fn format_pace(reading: &PaceReading) -> Option<String> {
    match reading {
        PaceReading::Value(seconds_per_km) => Some(format!("{}/km", format_min_sec(*seconds_per_km))),
        PaceReading::Infinite => Some(PACE_INFINITE.to_string()),
        PaceReading::Pending | PaceReading::Unavailable => None,
    }
}

/// Sink that writes readouts to the log; used by the command-line shell.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_pace: Option<String>,
}

impl DisplaySink for LogDisplay {
    fn show_marker(&mut self, position: SmoothedFix) {
        log::debug!(
            "marker at {:.6}, {:.6}",
            position.latitude,
            position.longitude
        );
    }

    fn show_duration(&mut self, text: &str) {
        log::debug!("time {text}");
    }

    fn show_distance(&mut self, text: &str) {
        info!("distance {text} km");
    }

    fn show_pace(&mut self, text: &str) {
        if self.last_pace.as_deref() != Some(text) {
            info!("pace {text}");
            self.last_pace = Some(text.to_string());
        }
    }

    fn show_controls(&mut self, controls: Controls) {
        log::debug!("controls {controls:?}");
    }

    fn report(&mut self, notice: &UserNotice) {
        warn!("{}", notice.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_zero_padded() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(3_725), "01:02:05");
        assert_eq!(format_duration(360_000), "100:00:00");
    }

    #[test]
    fn distance_has_two_decimals() {
        assert_eq!(format_distance(0.0), "0.00");
        assert_eq!(format_distance(5.678), "5.68");
    }

    #[test]
    fn pace_formats() {
        assert_eq!(format_pace(&PaceReading::Value(400.0)).as_deref(), Some("06:40/km"));
        assert_eq!(format_pace(&PaceReading::Value(299.6)).as_deref(), Some("05:00/km"));
        assert_eq!(format_pace(&PaceReading::Infinite).as_deref(), Some("∞/km"));
        assert_eq!(format_pace(&PaceReading::Pending), None);
        assert_eq!(format_pace(&PaceReading::Unavailable), None);
    }

    #[test]
    fn controls_follow_status() {
        let idle = Controls::for_status(SessionStatus::Idle, false);
        assert!(idle.start && !idle.pause && !idle.resume && !idle.finish);

        let blocked = Controls::for_status(SessionStatus::Idle, true);
        assert!(!blocked.start);

        let running = Controls::for_status(SessionStatus::Running, false);
        assert!(running.pause && running.finish && !running.start);

        let paused = Controls::for_status(SessionStatus::Paused, false);
        assert!(paused.resume && paused.finish && !paused.pause);
    }

    #[test]
    fn only_permission_denial_is_fatal() {
        let denied = UserNotice::Location {
            error: SensorError::PermissionDenied,
        };
        let timeout = UserNotice::Location {
            error: SensorError::Timeout,
        };
        assert!(denied.is_fatal());
        assert!(!timeout.is_fatal());
        assert!(!UserNotice::RunSaveFailed { reason: "disk full".into() }.is_fatal());
    }
}
