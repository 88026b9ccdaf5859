//! Daily snapshot service loop

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use mongosnap_core::{DocumentStore, ScheduleWindow, SnapshotManager};
use tokio::signal;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

/// Run scheduled snapshots until SIGINT or SIGTERM
///
/// A snapshot is taken at startup when already inside the window, then the
/// window is checked once per tick. Failures are logged and the loop keeps
/// going; a successful run marks the day as done.
pub async fn run<S: DocumentStore>(manager: &SnapshotManager<S>) -> Result<()> {
    let schedule = &manager.config().schedule;
    let window = schedule.window();
    let tick = schedule.tick();

    info!(
        "MongoDB Snapshot Service started (daily at {:02}:00, {} minute window, checked every {}s)",
        window.hour(),
        window.minutes(),
        tick.as_secs()
    );

    let mut last_run: Option<NaiveDate> = None;

    let now = Local::now().naive_local();
    if is_due(&window, last_run, now) && take_snapshot(manager, "initial").await {
        last_run = Some(now.date());
    }

    let mut ticker = interval_at(Instant::now() + tick, tick);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Local::now().naive_local();
                if is_due(&window, last_run, now) && take_snapshot(manager, "scheduled").await {
                    last_run = Some(now.date());
                }
            }
            received = &mut shutdown => {
                info!("Received signal {}, shutting down", received?);
                return Ok(());
            }
        }
    }
}

/// Inside the window and not yet done today
fn is_due(window: &ScheduleWindow, last_run: Option<NaiveDate>, now: NaiveDateTime) -> bool {
    window.contains(&now) && last_run != Some(now.date())
}

async fn take_snapshot<S: DocumentStore>(manager: &SnapshotManager<S>, kind: &str) -> bool {
    match manager.create_snapshot().await {
        Ok(summary) => {
            info!("{} snapshot {} created successfully", kind, summary.name);
            true
        }
        Err(e) => {
            error!("Failed to create {} snapshot: {}", kind, e);
            false
        }
    }
}

async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}
