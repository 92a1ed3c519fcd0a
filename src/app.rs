use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{data_dir, AppConfig, ConfigStore, CONFIG_FILE},
    db::Database,
    display::{format_distance, format_duration, LogDisplay},
    location::spawn_simulated_source,
    recovery::{FileRecoveryStorage, RecoveryManager},
    session::{spawn_session, SessionController, SessionHandle, SessionStatus},
    store::RunStore,
    utils::SystemClock,
};

const DATABASE_FILE: &str = "jogga.sqlite3";
const RECOVERY_DIR: &str = "recovery";

fn debug_enabled() -> bool {
    std::env::var("JOGGA_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn init_logging() {
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a test harness or embedder installed a logger first.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

/// Entry point of the command-line shell: wires the stores and plays one
/// session against the simulated location source.
pub fn run() -> Result<()> {
    init_logging();
    info!("Jogga starting up...");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings = ConfigStore::new(data_dir.join(CONFIG_FILE))?;
    if !settings.path().exists() {
        settings.save()?;
    }
    let config = settings.get();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(run_session(&data_dir, config))
}

async fn run_session(data_dir: &Path, config: AppConfig) -> Result<()> {
    let database = Database::new(data_dir.join(DATABASE_FILE))?;
    let runs: Arc<dyn RunStore> = Arc::new(database);
    let recovery = RecoveryManager::new(Box::new(FileRecoveryStorage::new(
        data_dir.join(RECOVERY_DIR),
    )?));

    let controller = SessionController::new(
        config.tracking,
        runs.clone(),
        recovery,
        Box::new(LogDisplay::default()),
        Arc::new(SystemClock),
    );
    let (session, session_task) = spawn_session(controller);

    let cancel_token = CancellationToken::new();
    let source = spawn_simulated_source(
        config.simulation,
        config.location,
        session.sender(),
        cancel_token.clone(),
    );

    let result = play_demo(&session, &config).await;

    cancel_token.cancel();
    if let Err(err) = source.await {
        warn!("simulated location source panicked: {err}");
    }
    session.shutdown()?;
    session_task.await.context("session loop panicked")?;

    result?;
    report_history(runs.as_ref()).await
}

async fn play_demo(session: &SessionHandle, config: &AppConfig) -> Result<()> {
    let run_for = Duration::from_secs(config.demo.run_seconds);
    let pause_for = Duration::from_secs(config.demo.pause_seconds);

    session.restore()?;
    let view = session.inspect().await?;
    if view.status == SessionStatus::Paused {
        info!(
            "Continuing recovered session {} at {} / {} km",
            view.session_id.as_deref().unwrap_or("?"),
            format_duration(view.elapsed_seconds),
            format_distance(view.total_distance_km)
        );
    } else {
        session.start()?;
        time::sleep(run_for).await;

        // Simulate the app being sent to the background and brought back.
        session.background()?;
        time::sleep(pause_for).await;
        session.foreground()?;
    }

    session.resume()?;
    time::sleep(run_for).await;
    session.finish()?;

    let view = session.inspect().await?;
    info!("Session ended; now {}", view.status.as_str());
    Ok(())
}

async fn report_history(runs: &dyn RunStore) -> Result<()> {
    let history = runs.list().await.context("failed to list runs")?;
    info!("{} run(s) on record", history.len());
    for run in history {
        info!(
            "  {} {}  {} km in {} ({} segments)",
            run.started_at.format("%Y-%m-%d %H:%M"),
            run.id,
            format_distance(run.total_distance_km),
            format_duration(run.total_duration_seconds),
            run.segments.len()
        );
    }
    Ok(())
}
