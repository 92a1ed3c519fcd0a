use serde::Serialize;
use thiserror::Error;

use crate::session::SessionStatus;

/// Failures reported by the location watch.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
}

impl SensorError {
    /// Permission denial stops tracking; the others are retried by the watch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SensorError::PermissionDenied)
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("failed to (de)serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for PersistenceError {
    fn from(err: anyhow::Error) -> Self {
        PersistenceError::Storage(format!("{err:#}"))
    }
}

/// User commands a session can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    Start,
    Pause,
    Continue,
    Finish,
    Restore,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Continue => "continue",
            Command::Finish => "finish",
            Command::Restore => "restore",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {} while {status:?}", command.as_str())]
    InvalidTransition {
        command: Command,
        status: SessionStatus,
    },
    #[error("location permission denied; tracking is disabled")]
    LocationBlocked,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
