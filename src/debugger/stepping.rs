use serde::Serialize;
use std::fmt;

/// Lifecycle of one debugger-attached process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NotStarted,
    Running,
    Stopped,
    Exited,
    /// The debugger channel died or timed out.
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Exited | SessionState::Failed)
    }
}

/// Why a run-control command returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// `number` is `N` or `N.M` for a fanned-out location.
    Breakpoint { number: String, location: String },
    FrameFinished { returned: Option<String> },
    Signal { name: String },
    Exited { code: i32 },
    Killed { signal: String },
    Unknown(String),
}

impl StopReason {
    /// State the session is in after this stop.
    pub fn next_state(&self) -> SessionState {
        match self {
            StopReason::Exited { .. } | StopReason::Killed { .. } => SessionState::Exited,
            _ => SessionState::Stopped,
        }
    }

    pub fn is_breakpoint(&self) -> bool {
        matches!(self, StopReason::Breakpoint { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Breakpoint { number, location } => {
                write!(f, "breakpoint {} at {}", number, location)
            }
            StopReason::FrameFinished { returned: Some(v) } => {
                write!(f, "frame finished, returned {}", v)
            }
            StopReason::FrameFinished { returned: None } => write!(f, "frame finished"),
            StopReason::Signal { name } => write!(f, "signal {}", name),
            StopReason::Exited { code } => write!(f, "exited with code {}", code),
            StopReason::Killed { signal } => write!(f, "terminated by {}", signal),
            StopReason::Unknown(text) => write!(f, "unknown stop: {}", text.trim()),
        }
    }
}
