use std::sync::Arc;

use folio_core::launch::SERVER_PORT;
use tauri::Manager;
use tokio::process::Child;
use tokio::sync::Mutex;

pub mod supervisor;
pub mod updater;

pub use supervisor::{launch_sequence, stop_worker, SuperviseError};

/// Label of the primary window. Labels are fixed so a repeat open focuses
/// the existing window instead of stacking a duplicate.
pub const MAIN_WINDOW: &str = "main";
const PLOT_WINDOW: &str = "plot";
const REBALANCE_WINDOW: &str = "rebalance";

/// Query values the worker's router understands.
pub const VIEW_PLOT: &str = "plotWeight";
pub const VIEW_REBALANCE: &str = "rebalance";

/// Shared state holder for the supervised worker process. Non-empty only
/// while a worker is believed alive.
#[derive(Clone)]
pub struct WorkerState {
    pub(crate) child: Arc<Mutex<Option<Child>>>,
}

impl Default for WorkerState {
    fn default() -> Self {
        Self {
            child: Arc::new(Mutex::new(None)),
        }
    }
}

fn server_url() -> String {
    format!("http://localhost:{SERVER_PORT}/")
}

fn view_url(view: &str) -> String {
    format!(
        "http://localhost:{SERVER_PORT}/?view={}",
        urlencoding::encode(view)
    )
}

/// Scrollbars off and overflow clipped inside the webview; the served UI
/// does its own scrolling.
const HIDE_SCROLLBARS_JS: &str = r#"
window.addEventListener('DOMContentLoaded', () => {
  const style = document.createElement('style');
  style.textContent = '::-webkit-scrollbar { display: none; } body { overflow: hidden !important; }';
  document.head.appendChild(style);
});
"#;

/// Open the primary window pointed at the local server, or focus it when
/// it already exists. Not part of the webview command surface; only the
/// readiness path calls this.
pub fn open_primary_window<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<(), String> {
    if app.get_webview_window(MAIN_WINDOW).is_none() {
        tauri::WebviewWindowBuilder::new(
            app,
            MAIN_WINDOW,
            tauri::WebviewUrl::External(server_url().parse().unwrap()),
        )
        .title("Folio")
        .inner_size(800.0, 400.0)
        .resizable(true)
        .initialization_script(HIDE_SCROLLBARS_JS)
        .build()
        .map_err(|e| e.to_string())?;
    } else if let Some(w) = app.get_webview_window(MAIN_WINDOW) {
        let _ = w.set_focus();
    }
    Ok(())
}

fn open_view_window<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    label: &str,
    title: &str,
    view: &str,
) -> Result<(), String> {
    if app.get_webview_window(label).is_none() {
        tauri::WebviewWindowBuilder::new(
            app,
            label,
            tauri::WebviewUrl::External(view_url(view).parse().unwrap()),
        )
        .title(title)
        .inner_size(1000.0, 800.0)
        .resizable(true)
        .initialization_script(HIDE_SCROLLBARS_JS)
        .build()
        .map_err(|e| e.to_string())?;
    } else if let Some(w) = app.get_webview_window(label) {
        let _ = w.set_focus();
    }
    Ok(())
}

mod cmds {
    use super::*;

    /// Open the standalone weight-plot view, or focus it if already shown.
    #[tauri::command]
    pub fn open_plot_window<R: tauri::Runtime>(app: tauri::AppHandle<R>) -> Result<(), String> {
        open_view_window(&app, PLOT_WINDOW, "Folio — Weight Plot", VIEW_PLOT)
    }

    /// Open the standalone rebalance view, or focus it if already shown.
    #[tauri::command]
    pub fn open_rebalance_window<R: tauri::Runtime>(
        app: tauri::AppHandle<R>,
    ) -> Result<(), String> {
        open_view_window(&app, REBALANCE_WINDOW, "Folio — Rebalance", VIEW_REBALANCE)
    }

    /// Build the Tauri plugin exposing the window commands to webview
    /// content. These two commands are the entire inbound surface.
    pub fn plugin<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
        tauri::plugin::Builder::new("folio")
            .invoke_handler(tauri::generate_handler![
                open_plot_window,
                open_rebalance_window
            ])
            .build()
    }
}

pub use cmds::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_urls_carry_the_view_query() {
        assert_eq!(server_url(), "http://localhost:8000/");
        assert_eq!(view_url(VIEW_PLOT), "http://localhost:8000/?view=plotWeight");
        assert_eq!(
            view_url(VIEW_REBALANCE),
            "http://localhost:8000/?view=rebalance"
        );
    }

    #[test]
    fn view_query_is_percent_encoded() {
        assert_eq!(view_url("a b&c"), "http://localhost:8000/?view=a%20b%26c");
    }
}
