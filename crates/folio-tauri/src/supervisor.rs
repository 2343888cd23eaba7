use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use folio_core::launch::{InstallMode, LaunchPlan, WorkerLayout};
use folio_core::readiness::{line_signals_ready, ReadyCause, ReadyGate};
use once_cell::sync::Lazy;
use tauri::Manager;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use crate::{open_primary_window, updater, WorkerState};

static READY_TIMEOUT: Lazy<Duration> =
    Lazy::new(|| ready_timeout_from(std::env::var("FOLIO_READY_TIMEOUT_MS").ok().as_deref()));

/// Fallback timer duration; values under a second are ignored.
fn ready_timeout_from(raw: Option<&str>) -> Duration {
    let ms = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value >= 1_000)
        .unwrap_or(10_000);
    Duration::from_millis(ms)
}

#[derive(thiserror::Error, Debug)]
pub enum SuperviseError {
    #[error("resources root unavailable: {0}")]
    Resources(String),
    #[error("launch plan: {0}")]
    Plan(String),
    #[error("spawn failure: {0}")]
    Spawn(String),
}

/// Run the full boot path: clear any prior worker, spawn a fresh one, then
/// race its stdout marker against the fallback timer. Also the relaunch
/// entry point for reactivation with no open windows.
pub fn launch_sequence<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(err) = run_launch(&app).await {
            warn!(target: "folio::supervisor", %err, "worker launch failed");
        }
    });
}

async fn run_launch<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<(), SuperviseError> {
    let state = app.state::<WorkerState>().inner().clone();
    // a relaunch must never stack a second worker on a lingering one
    stop_worker(&state).await;

    let mode = if cfg!(debug_assertions) {
        InstallMode::Dev
    } else {
        InstallMode::Packaged
    };
    let resources_root = match mode {
        InstallMode::Packaged => app
            .path()
            .resource_dir()
            .map_err(|err| SuperviseError::Resources(err.to_string()))?,
        InstallMode::Dev => {
            std::env::current_dir().map_err(|err| SuperviseError::Resources(err.to_string()))?
        }
    };
    let layout = WorkerLayout::resolve(mode, &resources_root);
    // existence is logged, not enforced; a bad path surfaces as a spawn error
    info!(
        target: "folio::supervisor",
        mode = mode.as_str(),
        rscript = %layout.rscript.display(),
        exists = layout.rscript.exists(),
        "resolved worker layout"
    );

    let plan =
        LaunchPlan::for_layout(&layout).map_err(|err| SuperviseError::Plan(err.to_string()))?;
    let mut child = command_for(&plan)
        .spawn()
        .map_err(|err| SuperviseError::Spawn(err.to_string()))?;
    info!(target: "folio::supervisor", pid = child.id(), "worker spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    *state.child.lock().await = Some(child);

    let gate = Arc::new(ReadyGate::new());

    if let Some(stdout) = stdout {
        let app = app.clone();
        let gate = Arc::clone(&gate);
        let state = state.clone();
        tauri::async_runtime::spawn(async move {
            scan_stdout(stdout, &gate, |cause| on_worker_ready(&app, cause)).await;
            observe_exit(&state).await;
        });
    }
    if let Some(stderr) = stderr {
        tauri::async_runtime::spawn(async move {
            mirror_stderr(stderr).await;
        });
    }
    {
        let app = app.clone();
        let gate = Arc::clone(&gate);
        tauri::async_runtime::spawn(async move {
            ready_timer(*READY_TIMEOUT, &gate, |cause| on_worker_ready(&app, cause)).await;
        });
    }
    Ok(())
}

fn command_for(plan: &LaunchPlan) -> Command {
    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.args)
        .current_dir(&plan.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &plan.env {
        cmd.env(key, value);
    }
    cmd
}

/// Mirror stdout lines to the log until the stream ends, engaging the gate
/// on the first marker line. Decoding is lossy: a localized runtime may
/// emit non-UTF-8 bytes and the marker scan must not stop on them.
async fn scan_stdout<T>(reader: T, gate: &ReadyGate, mut on_ready: impl FnMut(ReadyCause))
where
    T: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                info!(target: "folio::worker", "{line}");
                if line_signals_ready(line) && gate.engage(ReadyCause::Marker) {
                    on_ready(ReadyCause::Marker);
                }
            }
            Err(err) => {
                warn!(target: "folio::worker", %err, "stdout read failed");
                break;
            }
        }
    }
}

/// stderr gets the same lossy line treatment, mirrored at `warn!`.
async fn mirror_stderr<T>(reader: T)
where
    T: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                warn!(target: "folio::worker", "{}", line.trim_end_matches(['\r', '\n']));
            }
            Err(err) => {
                warn!(target: "folio::worker", %err, "stderr read failed");
                break;
            }
        }
    }
}

/// The timer is never cancelled; when the marker wins the race the gate
/// swallows its effect.
async fn ready_timer(timeout: Duration, gate: &ReadyGate, on_ready: impl FnOnce(ReadyCause)) {
    tokio::time::sleep(timeout).await;
    if gate.engage(ReadyCause::Timeout) {
        on_ready(ReadyCause::Timeout);
    }
}

/// Runs exactly once per launch attempt, from whichever race branch wins.
fn on_worker_ready<R: tauri::Runtime>(app: &tauri::AppHandle<R>, cause: ReadyCause) {
    info!(target: "folio::supervisor", cause = cause.as_str(), "worker presumed ready");
    if let Err(err) = open_primary_window(app) {
        warn!(target: "folio::supervisor", %err, "primary window failed to open");
    }
    info!(
        target: "folio::supervisor",
        version = %app.package_info().version,
        "application version"
    );
    updater::check_for_updates(app);
}

/// stdout EOF usually means the worker is gone; reap it and drop the
/// handle so a later stop stays a no-op.
async fn observe_exit(state: &WorkerState) {
    let mut guard = state.child.lock().await;
    if let Some(child) = guard.as_mut() {
        match child.try_wait() {
            Ok(Some(status)) => {
                info!(target: "folio::worker", code = ?status.code(), "worker exited");
                *guard = None;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(target: "folio::supervisor", %err, "worker liveness check failed");
            }
        }
    }
}

/// Kill the tracked worker, if any. Stopping with nothing tracked is a
/// no-op, so the window-closure and quit paths may both call this.
pub async fn stop_worker(state: &WorkerState) {
    if let Some(mut child) = state.child.lock().await.take() {
        info!(target: "folio::supervisor", pid = child.id(), "stopping worker");
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}
