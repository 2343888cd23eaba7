use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

/// Substring the worker prints once its embedded server accepts
/// connections, e.g. `Listening on http://0.0.0.0:8000`.
pub const READY_MARKER: &str = "Listening on";

/// True when a decoded output line carries the readiness marker.
pub fn line_signals_ready(line: &str) -> bool {
    line.contains(READY_MARKER)
}

/// Which branch of the readiness race fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyCause {
    /// The marker showed up on the worker's stdout.
    Marker,
    /// The fallback timer elapsed before any marker arrived.
    Timeout,
}

impl ReadyCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyCause::Marker => "marker",
            ReadyCause::Timeout => "timeout",
        }
    }
}

/// One-shot gate resolving the stdout-marker vs. fallback-timer race.
///
/// Both branches call [`ReadyGate::engage`]; exactly one call across all
/// threads returns `true` and records its cause, making the losing
/// branch's effect a no-op. A gate serves a single launch attempt;
/// relaunching starts over with a fresh gate.
#[derive(Debug, Default)]
pub struct ReadyGate {
    fired: AtomicBool,
    cause: OnceCell<ReadyCause>,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to win the race for `cause`. Returns `true` to exactly one
    /// caller over the gate's lifetime.
    pub fn engage(&self, cause: ReadyCause) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.cause.set(cause);
        true
    }

    pub fn is_engaged(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Winning cause, present once the gate has been engaged.
    pub fn cause(&self) -> Option<ReadyCause> {
        self.cause.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn marker_detection_is_substring_based() {
        assert!(line_signals_ready("Listening on http://0.0.0.0:8000"));
        assert!(line_signals_ready("[worker] Listening on port 8000"));
        assert!(!line_signals_ready("listening on port 8000"));
        assert!(!line_signals_ready("Loading required package: shiny"));
    }

    #[test]
    fn gate_engages_exactly_once() {
        let gate = ReadyGate::new();
        assert!(!gate.is_engaged());
        assert_eq!(gate.cause(), None);

        assert!(gate.engage(ReadyCause::Marker));
        assert!(gate.is_engaged());
        assert_eq!(gate.cause(), Some(ReadyCause::Marker));

        assert!(!gate.engage(ReadyCause::Marker));
        assert!(!gate.engage(ReadyCause::Timeout));
        assert_eq!(gate.cause(), Some(ReadyCause::Marker));
    }

    #[test]
    fn late_marker_does_not_overwrite_timeout_cause() {
        let gate = ReadyGate::new();
        assert!(gate.engage(ReadyCause::Timeout));
        assert!(!gate.engage(ReadyCause::Marker));
        assert_eq!(gate.cause(), Some(ReadyCause::Timeout));
    }

    #[test]
    fn concurrent_engage_yields_one_winner() {
        let gate = Arc::new(ReadyGate::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let gate = Arc::clone(&gate);
            handles.push(std::thread::spawn(move || {
                let cause = if i % 2 == 0 {
                    ReadyCause::Marker
                } else {
                    ReadyCause::Timeout
                };
                gate.engage(cause)
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert!(gate.cause().is_some());
    }
}
