pub mod launch;
pub mod logging;
pub mod readiness;
pub mod util;

pub use launch::{InstallMode, LaunchError, LaunchPlan, WorkerLayout, SERVER_PORT};
pub use readiness::{line_signals_ready, ReadyCause, ReadyGate, READY_MARKER};
