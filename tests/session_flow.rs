use std::{path::Path, sync::Arc};

use jogga_lib::{
    display::LogDisplay,
    models::RawFix,
    recovery::{FileRecoveryStorage, RecoveryManager},
    session::{spawn_session, SessionController, SessionEvent, SessionHandle, SessionStatus},
    tracking::TrackingConfig,
    utils::SystemClock,
    Database, RunStore,
};
use tokio::time::{self, Duration};

fn controller(dir: &Path, db: &Database) -> SessionController {
    let storage = FileRecoveryStorage::new(dir.join("recovery")).unwrap();
    SessionController::new(
        TrackingConfig::default(),
        Arc::new(db.clone()),
        RecoveryManager::new(Box::new(storage)),
        Box::new(LogDisplay::default()),
        Arc::new(SystemClock),
    )
}

/// Sends `count` accurate fixes heading north, roughly 3 m apart.
fn jog(session: &SessionHandle, from_ms: i64, count: usize) -> i64 {
    let mut t = from_ms;
    for _ in 0..count {
        t += 1_000;
        let lat = 48.8566 + t as f64 / 1_000.0 * 0.000027;
        let fix = RawFix::new(lat, 2.3522, 3.0, t).with_speed(2.5);
        session.send(SessionEvent::FixReceived(fix)).unwrap();
    }
    t
}

#[tokio::test(start_paused = true)]
async fn interrupted_session_is_recovered_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("jogga.sqlite3")).unwrap();

    // First process: run for a while, then get backgrounded and killed.
    let (session, task) = spawn_session(controller(dir.path(), &db));
    session.start().unwrap();
    let t = jog(&session, 0, 8);
    time::sleep(Duration::from_millis(5_500)).await;
    session.background().unwrap();

    let before = session.inspect().await.unwrap();
    assert_eq!(before.status, SessionStatus::Paused);
    assert_eq!(before.elapsed_seconds, 5);
    assert_eq!(before.segment_count, 1);
    assert!(before.total_distance_km > 0.0);
    assert!(!before.ticker_running);

    session.shutdown().unwrap();
    task.await.unwrap();
    assert!(dir.path().join("recovery").read_dir().unwrap().next().is_some());

    // Second process: pick the snapshot up and finish the run.
    let (session, task) = spawn_session(controller(dir.path(), &db));
    session.restore().unwrap();

    let restored = session.inspect().await.unwrap();
    assert_eq!(restored.status, SessionStatus::Paused);
    assert_eq!(restored.session_id, before.session_id);
    assert_eq!(restored.elapsed_seconds, 5);
    assert_eq!(restored.total_distance_km, before.total_distance_km);
    assert_eq!(restored.segment_count, 1);

    session.resume().unwrap();
    jog(&session, t, 5);
    session.finish().unwrap();

    let finished = session.inspect().await.unwrap();
    assert_eq!(finished.status, SessionStatus::Idle);
    assert_eq!(finished.total_distance_km, 0.0);

    session.shutdown().unwrap();
    task.await.unwrap();

    let runs = db.list().await.unwrap();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.total_duration_seconds, 5);
    assert_eq!(run.segments.len(), 2);
    assert_eq!(run.segments[0].len(), 8);
    assert_eq!(run.segments[1].len(), 5);
    assert!(run.total_distance_km > before.total_distance_km);

    // The snapshot was consumed; a third start has nothing to restore.
    let (session, task) = spawn_session(controller(dir.path(), &db));
    session.restore().unwrap();
    assert_eq!(session.inspect().await.unwrap().status, SessionStatus::Idle);
    session.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn finishing_without_moving_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("jogga.sqlite3")).unwrap();

    let (session, task) = spawn_session(controller(dir.path(), &db));
    session.start().unwrap();
    time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(session.inspect().await.unwrap().elapsed_seconds, 2);

    session.finish().unwrap();
    let view = session.inspect().await.unwrap();
    assert_eq!(view.status, SessionStatus::Idle);
    assert_eq!(view.elapsed_seconds, 0);

    session.shutdown().unwrap();
    task.await.unwrap();
    assert!(db.list().await.unwrap().is_empty());
}
