use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use super::{SessionController, SessionEvent, SessionView};
use crate::error::SessionError;

/// Cloneable entry point into a running session loop.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|err| anyhow!("session loop has stopped; dropped {}", err.0.name()))
    }

    /// Sender for producers that feed the queue directly, like the location source.
    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events.clone()
    }

    pub fn start(&self) -> Result<()> {
        self.send(SessionEvent::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(SessionEvent::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(SessionEvent::Continue)
    }

    pub fn finish(&self) -> Result<()> {
        self.send(SessionEvent::Finish)
    }

    pub fn background(&self) -> Result<()> {
        self.send(SessionEvent::Backgrounded)
    }

    pub fn foreground(&self) -> Result<()> {
        self.send(SessionEvent::Foregrounded)
    }

    pub fn restore(&self) -> Result<()> {
        self.send(SessionEvent::Restored)
    }

    /// Waits until every event queued before this call has been applied.
    pub async fn inspect(&self) -> Result<SessionView> {
        let (reply, view) = oneshot::channel();
        self.send(SessionEvent::Inspect(reply))?;
        view.await
            .map_err(|_| anyhow!("session loop stopped before answering"))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown)
    }
}

/// Moves the controller onto its own task and feeds it events in arrival order.
///
/// The task hands the controller back once `Shutdown` is processed or every
/// sender has gone away.
pub fn spawn_session(
    mut controller: SessionController,
) -> (SessionHandle, JoinHandle<SessionController>) {
    let (events, mut queue) = mpsc::unbounded_channel();
    controller.attach_ticker(&events);

    let handle = tokio::spawn(async move {
        while let Some(event) = queue.recv().await {
            let name = event.name();
            let routine = event.is_routine();
            let stop = matches!(event, SessionEvent::Shutdown);

            match controller.handle(event).await {
                Ok(()) => {
                    if !routine {
                        debug!("applied {name} -> {}", controller.status().as_str());
                    }
                }
                Err(err @ SessionError::InvalidTransition { .. }) => {
                    warn!("ignored {name}: {err}");
                }
                Err(err) => {
                    error!("{name} failed: {err}");
                }
            }

            if stop {
                break;
            }
        }

        controller.shutdown();
        info!("session loop stopped");
        controller
    });

    (SessionHandle { events }, handle)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::time::{self, Duration};

    use super::*;
    use crate::{
        display::LogDisplay,
        error::PersistenceError,
        models::{RawFix, Run},
        recovery::RecoveryManager,
        session::SessionStatus,
        store::RunStore,
        tracking::TrackingConfig,
        utils::SystemClock,
    };

    struct NoRuns;

    #[async_trait]
    impl RunStore for NoRuns {
        async fn create(&self, run: Run) -> Result<String, PersistenceError> {
            Ok(run.id)
        }

        async fn list(&self) -> Result<Vec<Run>, PersistenceError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _id: &str) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn controller() -> SessionController {
        SessionController::new(
            TrackingConfig::default(),
            Arc::new(NoRuns),
            RecoveryManager::in_memory(),
            Box::new(LogDisplay::default()),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_flow_through_the_loop() {
        let (session, task) = spawn_session(controller());
        session.start().unwrap();
        assert_eq!(session.inspect().await.unwrap().status, SessionStatus::Running);

        time::sleep(Duration::from_millis(3_500)).await;
        session.pause().unwrap();
        let view = session.inspect().await.unwrap();
        assert_eq!(view.status, SessionStatus::Paused);
        assert_eq!(view.elapsed_seconds, 3);
        assert!(!view.ticker_running);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.inspect().await.unwrap().elapsed_seconds, 3);

        session.shutdown().unwrap();
        let controller = task.await.unwrap();
        assert!(!controller.ticker().is_running());
    }

    #[tokio::test]
    async fn invalid_commands_do_not_stop_the_loop() {
        let (session, task) = spawn_session(controller());
        session.pause().unwrap();
        session.finish().unwrap();
        session
            .send(SessionEvent::FixReceived(RawFix::new(10.0, 10.0, 4.0, 0)))
            .unwrap();

        let view = session.inspect().await.unwrap();
        assert_eq!(view.status, SessionStatus::Idle);
        assert_eq!(view.total_distance_km, 0.0);

        drop(session);
        let controller = task.await.unwrap();
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn sending_after_shutdown_fails() {
        let (session, task) = spawn_session(controller());
        session.shutdown().unwrap();
        task.await.unwrap();
        assert!(session.start().is_err());
        assert!(session.inspect().await.is_err());
    }
}
