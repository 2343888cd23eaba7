use folio_core::util::env_bool;
use tauri_plugin_updater::UpdaterExt;
use tracing::{info, warn};

/// Fire one update check and log whatever comes back. Dev builds skip the
/// check unless `FOLIO_UPDATE_CHECK` forces it on; a false value
/// suppresses it everywhere.
pub fn check_for_updates<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    let enabled = env_bool("FOLIO_UPDATE_CHECK").unwrap_or(!cfg!(debug_assertions));
    if !enabled {
        info!(target: "folio::updater", "update check skipped");
        return;
    }
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        check_now(app).await;
    });
}

async fn check_now<R: tauri::Runtime>(app: tauri::AppHandle<R>) {
    let updater = match app.updater() {
        Ok(updater) => updater,
        Err(err) => {
            warn!(target: "folio::updater", %err, "updater unavailable");
            return;
        }
    };
    info!(target: "folio::updater", "checking for updates");
    match updater.check().await {
        Ok(Some(update)) => {
            info!(target: "folio::updater", version = %update.version, "update available");
            let mut downloaded: u64 = 0;
            let mut last_logged: Option<u64> = None;
            let outcome = update
                .download_and_install(
                    |chunk, total| {
                        downloaded += chunk as u64;
                        if let Some(total) = total {
                            let percent = downloaded.saturating_mul(100) / total.max(1);
                            if last_logged != Some(percent) {
                                last_logged = Some(percent);
                                info!(target: "folio::updater", percent, "downloading update");
                            }
                        }
                    },
                    || {
                        info!(target: "folio::updater", "update downloaded");
                    },
                )
                .await;
            match outcome {
                Ok(()) => {
                    info!(target: "folio::updater", "restarting to apply update");
                    app.restart();
                }
                Err(err) => warn!(target: "folio::updater", %err, "update install failed"),
            }
        }
        Ok(None) => info!(target: "folio::updater", "no update available"),
        Err(err) => warn!(target: "folio::updater", %err, "update check failed"),
    }
}
