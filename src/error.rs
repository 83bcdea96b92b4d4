use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not start debug session: {0}")]
    SessionStart(String),

    #[error("No active frame: the process is not stopped")]
    NoActiveFrame,

    #[error("Cannot evaluate `{expr}`: {message}")]
    Evaluation { expr: String, message: String },

    #[error("Debugger did not answer `{command}` within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Session is in a terminal state, start a new one")]
    Terminated,

    #[error("Debugger closed its output channel")]
    ChannelClosed,

    #[error("Debugger error: {0}")]
    Debugger(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Environment failures abort a case without retry.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            SessionError::SessionStart(_)
                | SessionError::ChannelClosed
                | SessionError::Timeout { .. }
                | SessionError::Terminated
                | SessionError::Io(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Cannot split arguments: {0}")]
    Args(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
