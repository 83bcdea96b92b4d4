use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything needed to launch one debugger-attached process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Debugger executable, looked up on `PATH` when not absolute.
    pub gdb: PathBuf,
    /// Image to run under the debugger.
    pub target: PathBuf,
    pub args: LaunchArgs,
    pub env: BTreeMap<String, String>,
    /// Extra debugger commands issued after the prelude, before launch.
    pub init_commands: Vec<String>,
    /// Helper script sourced by suites that need pretty printers and unwinders.
    pub debughelpers: Option<PathBuf>,
    pub command_timeout_secs: u64,
    pub run_timeout_secs: u64,
    /// Launch with `start` (stop in `main`) instead of `run`.
    pub stop_at_entry: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gdb: PathBuf::from("gdb"),
            target: PathBuf::new(),
            args: LaunchArgs::default(),
            env: BTreeMap::new(),
            init_commands: Vec::new(),
            debughelpers: None,
            command_timeout_secs: 30,
            run_timeout_secs: 600,
            stop_at_entry: true,
        }
    }
}

/// Launch arguments: either a list, or one shell-quoted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaunchArgs {
    List(Vec<String>),
    Line(String),
}

impl Default for LaunchArgs {
    fn default() -> Self {
        LaunchArgs::List(Vec::new())
    }
}

impl LaunchArgs {
    pub fn to_vec(&self) -> Result<Vec<String>, ConfigError> {
        match self {
            LaunchArgs::List(args) => Ok(args.clone()),
            LaunchArgs::Line(line) => shlex::split(line)
                .ok_or_else(|| ConfigError::Args(format!("unbalanced quotes in `{}`", line))),
        }
    }

    pub fn push(&mut self, arg: String) -> Result<(), ConfigError> {
        let mut args = self.to_vec()?;
        args.push(arg);
        *self = LaunchArgs::List(args);
        Ok(())
    }
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("`target` is required".to_string()));
        }
        if self.command_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(ConfigError::Invalid(format!(
                    "invalid environment variable name `{}`",
                    key
                )));
            }
        }
        self.args.to_vec()?;
        Ok(())
    }

    /// Applies a `KEY=VALUE` override.
    pub fn set_env_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                self.env.insert(key.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(ConfigError::Invalid(format!(
                "expected KEY=VALUE, got `{}`",
                pair
            ))),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// The `set args ...` command for the configured launch arguments.
    pub fn set_args_command(&self) -> Result<String, ConfigError> {
        let args = self.args.to_vec()?;
        let joined = shlex::try_join(args.iter().map(String::as_str))
            .map_err(|e| ConfigError::Args(e.to_string()))?;
        Ok(format!("set args {}", joined).trim_end().to_string())
    }
}
