use std::sync::Arc;

use tokio::{sync::mpsc, time::Duration};
use uuid::Uuid;

use super::{SessionContext, SessionEvent, SessionStatus, SessionView, Ticker};
use crate::{
    display::{
        format_distance, format_duration, format_pace, Controls, DisplaySink, UserNotice,
        PACE_PENDING,
    },
    error::{Command, PersistenceError, SensorError, SessionError},
    models::{RawFix, SmoothedFix},
    recovery::RecoveryManager,
    store::RunStore,
    tracking::{PaceReading, TrackingConfig},
    utils::Clock,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// What happened to the run when a session was finished.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// No distance was covered; nothing was stored.
    Discarded,
    Saved { run_id: String },
    /// The store rejected the run. The user has been told; the session reset anyway.
    SaveFailed { run_id: String, reason: String },
}

pub struct SessionController {
    ctx: SessionContext,
    config: TrackingConfig,
    runs: Arc<dyn RunStore>,
    recovery: RecoveryManager,
    display: Box<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
    ticker: Ticker,
    location_blocked: bool,
    pace: PaceReading,
}

impl SessionController {
    pub fn new(
        config: TrackingConfig,
        runs: Arc<dyn RunStore>,
        recovery: RecoveryManager,
        display: Box<dyn DisplaySink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut controller = Self {
            ctx: SessionContext::new(&config),
            config,
            runs,
            recovery,
            display,
            clock,
            ticker: Ticker::new(Duration::from_secs(1)),
            location_blocked: false,
            pace: PaceReading::Pending,
        };
        controller.refresh_readouts();
        controller
    }

    /// Deliver elapsed-time ticks into `events` instead of waiting for manual ticks.
    pub fn attach_ticker(&mut self, events: &mpsc::UnboundedSender<SessionEvent>) {
        self.ticker.attach(events);
    }

    pub fn status(&self) -> SessionStatus {
        self.ctx.status()
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn is_location_blocked(&self) -> bool {
        self.location_blocked
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            status: self.ctx.status(),
            session_id: self.ctx.session_id().map(str::to_string),
            elapsed_seconds: self.ctx.elapsed_seconds(),
            total_distance_km: self.ctx.total_distance_km(),
            segment_count: self.ctx.segments().len(),
            open_segment_points: self.ctx.open_segment().map(<[SmoothedFix]>::len),
            pace: self.pace,
            location_blocked: self.location_blocked,
            ticker_running: self.ticker.is_running(),
        }
    }

    /// Applies one event to completion.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::FixReceived(fix) => {
                self.ingest_fix(&fix);
                Ok(())
            }
            SessionEvent::LocationFailed(error) => {
                self.location_failed(error);
                Ok(())
            }
            SessionEvent::PermissionRestored => {
                self.permission_restored();
                Ok(())
            }
            SessionEvent::Tick { generation } => {
                self.tick(generation);
                Ok(())
            }
            SessionEvent::Start => self.start().map(|_| ()),
            SessionEvent::Pause => self.pause().map(|_| ()),
            SessionEvent::Continue => self.resume().map(|_| ()),
            SessionEvent::Finish => self.finish().await.map(|_| ()),
            SessionEvent::Backgrounded => self.background().map(|_| ()),
            SessionEvent::Foregrounded => self.foreground().map(|_| ()),
            SessionEvent::Restored => self.restore().map(|_| ()),
            SessionEvent::Inspect(reply) => {
                let _ = reply.send(self.view());
                Ok(())
            }
            SessionEvent::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Stops the timer. The session itself is left as it is.
    pub fn shutdown(&mut self) {
        self.ticker.stop();
    }

    pub fn ingest_fix(&mut self, fix: &RawFix) -> SmoothedFix {
        let smoothed = self.ctx.smooth(fix);
        self.display.show_marker(smoothed);

        if let Some(reading) = self.ctx.record(smoothed, fix.speed_meters_per_second) {
            self.display
                .show_distance(&format_distance(self.ctx.total_distance_km()));
            if let Some(text) = format_pace(&reading) {
                self.pace = reading;
                self.display.show_pace(&text);
            }
        }

        smoothed
    }

    /// Counts one second if the tick came from the live timer.
    pub fn tick(&mut self, generation: u64) -> bool {
        if !self.ticker.accepts(generation) {
            log_debug!("dropping stale tick from generation {generation}");
            return false;
        }
        if !self.ctx.tick() {
            return false;
        }
        self.display
            .show_duration(&format_duration(self.ctx.elapsed_seconds()));
        true
    }

    pub fn start(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure(Command::Start, &[SessionStatus::Idle])?;
        if self.location_blocked {
            return Err(SessionError::LocationBlocked);
        }

        let session_id = Uuid::new_v4().to_string();
        self.ctx.begin(session_id.clone(), self.clock.now());
        self.ticker.start();
        self.reset_pace_display();
        self.refresh_readouts();

        log_info!("session {session_id} started");
        Ok(self.ctx.status())
    }

    pub fn pause(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure(Command::Pause, &[SessionStatus::Running])?;
        self.pause_running();
        log_info!(
            "session paused at {:.3} km after {}s",
            self.ctx.total_distance_km(),
            self.ctx.elapsed_seconds()
        );
        Ok(self.ctx.status())
    }

    pub fn resume(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure(Command::Continue, &[SessionStatus::Paused])?;
        if self.location_blocked {
            return Err(SessionError::LocationBlocked);
        }

        self.ctx.resume();
        self.ticker.start();
        self.reset_pace_display();
        self.show_controls();

        log_info!("session continued (segment {})", self.ctx.segments().len() + 1);
        Ok(self.ctx.status())
    }

    pub async fn finish(&mut self) -> Result<FinishOutcome, SessionError> {
        self.ensure(
            Command::Finish,
            &[SessionStatus::Running, SessionStatus::Paused],
        )?;

        self.ticker.stop();
        let run = self.ctx.finish(Uuid::new_v4().to_string());
        self.show_controls();

        if let Err(err) = self.recovery.clear_snapshot() {
            log_warn!("failed to clear session snapshot: {err}");
        }

        let outcome = match run {
            None => {
                log_info!("session finished without distance; nothing to save");
                FinishOutcome::Discarded
            }
            Some(run) => {
                let run_id = run.id.clone();
                let distance = run.total_distance_km;
                match self.runs.create(run).await {
                    Ok(run_id) => {
                        log_info!("saved run {run_id} ({distance:.2} km)");
                        FinishOutcome::Saved { run_id }
                    }
                    Err(err) => {
                        log_error!("failed to save run {run_id}: {err}");
                        let reason = err.to_string();
                        self.display.report(&UserNotice::RunSaveFailed {
                            reason: reason.clone(),
                        });
                        FinishOutcome::SaveFailed { run_id, reason }
                    }
                }
            }
        };

        self.ctx.reset(&self.config);
        self.reset_pace_display();
        self.refresh_readouts();
        Ok(outcome)
    }

    /// The app went to the background: pause and write a snapshot.
    ///
    /// Returns whether a snapshot was written. Idle sessions and paused ones
    /// already on disk have nothing to save.
    pub fn background(&mut self) -> Result<bool, SessionError> {
        match self.ctx.status() {
            SessionStatus::Running => {
                self.pause_running();
                log_info!("app backgrounded while running; session paused");
            }
            SessionStatus::Paused if self.ctx.has_unsaved_progress() => {}
            _ => return Ok(false),
        }

        match self.recovery.save_snapshot(&mut self.ctx) {
            Ok(saved) => {
                if saved {
                    log_info!(
                        "session snapshot written ({} segments, {:.3} km)",
                        self.ctx.segments().len(),
                        self.ctx.total_distance_km()
                    );
                }
                Ok(saved)
            }
            Err(err) => Err(self.snapshot_failed(err)),
        }
    }

    /// Back in the foreground. An idle controller (the process was restarted)
    /// picks the snapshot up. A live session leaves it on disk: it stays the
    /// recovery point until the next background overwrites it or finish clears it.
    pub fn foreground(&mut self) -> Result<bool, SessionError> {
        if self.ctx.status() == SessionStatus::Idle {
            return self.restore();
        }
        Ok(false)
    }

    /// Resume an interrupted session from its snapshot, ending up paused.
    pub fn restore(&mut self) -> Result<bool, SessionError> {
        self.ensure(Command::Restore, &[SessionStatus::Idle])?;

        let snapshot = match self.recovery.load_snapshot() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(false),
            Err(err) => return Err(self.snapshot_failed(err)),
        };

        log_warn!(
            "recovered interrupted session {} ({}s, {:.3} km, {} segments)",
            snapshot.session_id,
            snapshot.elapsed_seconds,
            snapshot.total_distance_km,
            snapshot.segments.len()
        );

        self.ctx.restore(snapshot, &self.config);
        self.reset_pace_display();
        self.refresh_readouts();
        Ok(true)
    }

    pub fn location_failed(&mut self, error: SensorError) {
        self.display.report(&UserNotice::Location { error });

        if !error.is_fatal() {
            log_warn!("location error: {error}; waiting for the next fix");
            return;
        }

        log_error!("location error: {error}; tracking disabled");
        self.location_blocked = true;
        if self.ctx.status() == SessionStatus::Running {
            self.pause_running();
        } else {
            self.show_controls();
        }
    }

    pub fn permission_restored(&mut self) {
        if self.location_blocked {
            log_info!("location permission restored");
            self.location_blocked = false;
            self.show_controls();
        }
    }

    fn pause_running(&mut self) {
        self.ticker.stop();
        self.ctx.pause();
        self.reset_pace_display();
        self.show_controls();
    }

    fn ensure(&self, command: Command, allowed: &[SessionStatus]) -> Result<(), SessionError> {
        let status = self.ctx.status();
        if allowed.contains(&status) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { command, status })
        }
    }

    fn snapshot_failed(&mut self, err: PersistenceError) -> SessionError {
        log_error!("session snapshot failure: {err}");
        self.display.report(&UserNotice::SnapshotFailed {
            reason: err.to_string(),
        });
        SessionError::Persistence(err)
    }

    fn reset_pace_display(&mut self) {
        self.pace = PaceReading::Pending;
        self.display.show_pace(PACE_PENDING);
    }

    fn show_controls(&mut self) {
        self.display
            .show_controls(Controls::for_status(self.ctx.status(), self.location_blocked));
    }

    fn refresh_readouts(&mut self) {
        self.display
            .show_duration(&format_duration(self.ctx.elapsed_seconds()));
        self.display
            .show_distance(&format_distance(self.ctx.total_distance_km()));
        self.show_controls();
    }
}
