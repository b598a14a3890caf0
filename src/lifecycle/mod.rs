//! Lifecycle of the publication loop

use std::fmt;

/// State of the publication scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Ticking and emitting intermediate waypoints
    Running,
    /// Arrival detected; the exact target still has to be emitted
    Stopping,
    /// Terminal
    Stopped(ExitStatus),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Stopped(_))
    }

    /// Exit status once stopped
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            State::Stopped(status) => Some(*status),
            _ => None,
        }
    }
}

/// Why the scheduler stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Target reached and final waypoint published
    Arrived,
    /// Too many consecutive tick failures
    Failed,
    /// External stop signal
    Cancelled,
}

impl ExitStatus {
    /// Process exit code for this status
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Arrived => 0,
            ExitStatus::Failed => 1,
            ExitStatus::Cancelled => 130,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Arrived => write!(f, "arrived"),
            ExitStatus::Failed => write!(f, "failed"),
            ExitStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Tracks the scheduler state and enforces legal transitions
#[derive(Debug)]
pub struct Lifecycle {
    name: String,
    state: State,
}

impl Lifecycle {
    pub fn new(name: &str) -> Self {
        Lifecycle {
            name: name.to_string(),
            state: State::Running,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Running -> Stopping; ignored in any other state
    pub fn begin_stopping(&mut self) {
        if self.state == State::Running {
            log::info!("[{}] target within tolerance, stopping", self.name);
            self.state = State::Stopping;
        }
    }

    /// Any state -> Stopped; the first terminal status wins
    pub fn stop(&mut self, status: ExitStatus) {
        if !self.state.is_terminal() {
            log::info!("[{}] stopped ({})", self.name, status);
            self.state = State::Stopped(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_and_stops_through_stopping() {
        let mut lifecycle = Lifecycle::new("test");
        assert_eq!(lifecycle.state(), State::Running);
        lifecycle.begin_stopping();
        assert_eq!(lifecycle.state(), State::Stopping);
        lifecycle.stop(ExitStatus::Arrived);
        assert_eq!(lifecycle.state().exit_status(), Some(ExitStatus::Arrived));
    }

    #[test]
    fn stopped_is_terminal() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.stop(ExitStatus::Cancelled);
        lifecycle.begin_stopping();
        lifecycle.stop(ExitStatus::Arrived);
        assert_eq!(lifecycle.state(), State::Stopped(ExitStatus::Cancelled));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Arrived.code(), 0);
        assert_eq!(ExitStatus::Failed.code(), 1);
        assert_eq!(ExitStatus::Cancelled.code(), 130);
    }
}
