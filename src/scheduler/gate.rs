//! Single-flight admission for reconciliation runs
//!
//! ```text
//!        request            finish (no pending)
//! Idle ──────────▶ Running ────────────────────▶ Idle
//!                   │  ▲
//!           request │  │ finish (pending) → rerun
//!                   ▼  │
//!            Running + pending
//! ```
//!
//! Any number of requests while running collapse into one pending rerun.

/// Whether a run is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Decision for an incoming trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Start a run now
    Start,
    /// A run is in progress; one rerun is remembered
    Coalesced,
}

#[derive(Debug, Default)]
pub struct RunGate {
    state: RunState,
    rerun_pending: bool,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn rerun_pending(&self) -> bool {
        self.rerun_pending
    }

    pub fn request(&mut self) -> Admission {
        match self.state {
            RunState::Idle => {
                self.state = RunState::Running;
                Admission::Start
            }
            RunState::Running => {
                self.rerun_pending = true;
                Admission::Coalesced
            }
        }
    }

    /// Record the end of the current run
    ///
    /// Returns `true` if a coalesced rerun should start right away; the gate
    /// then stays `Running`.
    pub fn finish(&mut self) -> bool {
        if std::mem::take(&mut self.rerun_pending) {
            true
        } else {
            self.state = RunState::Idle;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_when_idle_starts_run() {
        let mut gate = RunGate::new();

        assert_eq!(gate.request(), Admission::Start);
        assert_eq!(gate.state(), RunState::Running);
        assert!(!gate.rerun_pending());
    }

    #[test]
    fn finish_without_pending_returns_to_idle() {
        let mut gate = RunGate::new();
        gate.request();

        assert!(!gate.finish());
        assert_eq!(gate.state(), RunState::Idle);
    }

    #[test]
    fn requests_while_running_collapse_into_one_rerun() {
        let mut gate = RunGate::new();
        gate.request();

        assert_eq!(gate.request(), Admission::Coalesced);
        assert_eq!(gate.request(), Admission::Coalesced);
        assert_eq!(gate.request(), Admission::Coalesced);

        assert!(gate.finish());
        assert_eq!(gate.state(), RunState::Running);
        assert!(!gate.finish());
        assert_eq!(gate.state(), RunState::Idle);
    }

    #[test]
    fn request_after_idle_starts_again() {
        let mut gate = RunGate::new();
        gate.request();
        gate.finish();

        assert_eq!(gate.request(), Admission::Start);
    }
}
