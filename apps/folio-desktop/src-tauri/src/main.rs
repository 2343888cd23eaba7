#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use folio_tauri::{plugin as folio_plugin, WorkerState};
use tauri::Manager;

fn main() {
    folio_core::logging::init();

    tauri::Builder::<tauri::Wry>::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            // a second instance just brings the running one forward
            if let Some(w) = app.get_webview_window(folio_tauri::MAIN_WINDOW) {
                let _ = w.set_focus();
            }
        }))
        .plugin(folio_plugin::<tauri::Wry>())
        .manage(WorkerState::default())
        .setup(|app| {
            #[cfg(all(desktop, not(test)))]
            {
                let _ = app
                    .handle()
                    .plugin(tauri_plugin_updater::Builder::new().build::<tauri::Wry>());
            }
            folio_tauri::launch_sequence(app.handle());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(handle_run_event);
}

fn handle_run_event(app_handle: &tauri::AppHandle, event: tauri::RunEvent) {
    match event {
        // the last window closed, or an explicit exit was requested
        #[cfg(target_os = "macos")]
        tauri::RunEvent::ExitRequested { code, api, .. } => {
            let state = app_handle.state::<WorkerState>();
            tauri::async_runtime::block_on(folio_tauri::stop_worker(&state));
            // dock convention: stay resident after the last window closes
            if code.is_none() {
                api.prevent_exit();
            }
        }
        #[cfg(not(target_os = "macos"))]
        tauri::RunEvent::ExitRequested { .. } => {
            let state = app_handle.state::<WorkerState>();
            tauri::async_runtime::block_on(folio_tauri::stop_worker(&state));
        }
        // stop once more on the way out; stopping an untracked worker is a no-op
        tauri::RunEvent::Exit => {
            let state = app_handle.state::<WorkerState>();
            tauri::async_runtime::block_on(folio_tauri::stop_worker(&state));
        }
        #[cfg(target_os = "macos")]
        tauri::RunEvent::Reopen {
            has_visible_windows,
            ..
        } => {
            if !has_visible_windows {
                folio_tauri::launch_sequence(app_handle);
            }
        }
        _ => {}
    }
}
