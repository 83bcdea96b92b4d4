use super::breakpoints::{BreakpointSet, Breakpoints};
use super::session::{CommandChannel, GdbSession};
use super::stepping::{SessionState, StopReason};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::parser::{self, Backtrace, BreakpointTable, FunctionListing, LoadedModule};
use crate::parser::{TypeDescription, VariableValue};
use std::path::Path;
use std::time::Duration;

/// Settings every session needs regardless of configuration.
const PRELUDE: &[&str] = &[
    "set pagination off",
    "set height 0",
    "set width 0",
    "set confirm off",
    "set breakpoint pending on",
    "set print pretty off",
];

/// One debugger-attached process, owned by exactly one test case.
///
/// Dropping the context tears the process and the debugger down, so a failed
/// case cannot leak breakpoints or an inferior into the next one.
pub struct DebugContext<C: CommandChannel = GdbSession> {
    channel: C,
    state: SessionState,
    breakpoints: Breakpoints,
    command_timeout: Duration,
    run_timeout: Duration,
    killed: bool,
}

impl DebugContext<GdbSession> {
    /// Spawn the debugger and launch `config.target` under it.
    pub fn start(config: &SessionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SessionError::SessionStart(e.to_string()))?;
        if !config.target.is_file() {
            return Err(SessionError::SessionStart(format!(
                "target image `{}` not found",
                config.target.display()
            )));
        }
        let channel = GdbSession::start(&config.gdb, config.command_timeout())?;
        Self::launch(channel, config)
    }
}

impl<C: CommandChannel> DebugContext<C> {
    /// Prepare the debugger behind `channel` and launch the configured target.
    /// Earlier breakpoints are deleted before the process starts.
    pub fn launch(channel: C, config: &SessionConfig) -> Result<Self> {
        let mut ctx = Self {
            channel,
            state: SessionState::NotStarted,
            breakpoints: Breakpoints::new(),
            command_timeout: config.command_timeout(),
            run_timeout: config.run_timeout(),
            killed: false,
        };

        match ctx.prepare_and_run(config) {
            Ok(reason) => {
                tracing::info!(image = %config.target.display(), %reason, "session started");
                Ok(ctx)
            }
            Err(e) => {
                let _ = ctx.kill();
                Err(match e {
                    SessionError::SessionStart(_) => e,
                    other => SessionError::SessionStart(other.to_string()),
                })
            }
        }
    }

    fn prepare_and_run(&mut self, config: &SessionConfig) -> Result<StopReason> {
        for command in PRELUDE {
            self.exec(command)?;
        }

        let target = config.target.to_string_lossy();
        let quoted = shlex::try_quote(&target)
            .map_err(|e| SessionError::SessionStart(e.to_string()))?;
        let out = self.exec(&format!("file {}", quoted))?;
        if let Some(err) = load_error(&out) {
            return Err(SessionError::SessionStart(err));
        }

        self.exec("delete breakpoints")?;

        let set_args = config
            .set_args_command()
            .map_err(|e| SessionError::SessionStart(e.to_string()))?;
        self.exec(&set_args)?;
        for (key, value) in &config.env {
            self.exec(&format!("set environment {}={}", key, value))?;
        }
        for command in &config.init_commands {
            self.exec(command)?;
        }

        let launch = if config.stop_at_entry { "start" } else { "run" };
        self.state = SessionState::Running;
        let out = self.exec_with(launch, self.run_timeout)?;
        let reason = parser::parse_stop_reason(&out);
        if config.stop_at_entry && !reason.is_breakpoint() {
            return Err(SessionError::SessionStart(format!(
                "`{}` did not stop at the entry point: {}",
                launch, reason
            )));
        }
        self.state = reason.next_state();
        Ok(reason)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    fn exec(&mut self, command: &str) -> Result<String> {
        self.exec_with(command, self.command_timeout)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.state == SessionState::Failed || self.killed {
            return Err(SessionError::Terminated);
        }
        Ok(())
    }

    fn exec_with(&mut self, command: &str, timeout: Duration) -> Result<String> {
        self.ensure_alive()?;
        match self.channel.run(command, timeout) {
            Ok(out) => Ok(out),
            Err(e) => {
                if e.is_environment() {
                    tracing::error!(command, error = %e, "debugger channel failed");
                    self.state = SessionState::Failed;
                }
                Err(e)
            }
        }
    }

    fn require_stopped(&self) -> Result<()> {
        match self.state {
            SessionState::Stopped => Ok(()),
            SessionState::Failed => Err(SessionError::Terminated),
            _ => Err(SessionError::NoActiveFrame),
        }
    }

    /// Pass a raw command through and return its output. A command the
    /// debugger rejects is an error.
    pub fn execute(&mut self, command: &str) -> Result<String> {
        self.exec_checked(command)
    }

    fn exec_checked(&mut self, command: &str) -> Result<String> {
        let out = self.exec(command)?;
        match parser::leading_error(&out) {
            Some(err) => Err(SessionError::Debugger(err.to_string())),
            None => Ok(out),
        }
    }

    /// Set a breakpoint by fully qualified name. Unknown symbols give a
    /// pending breakpoint that resolves once the owning module loads.
    pub fn set_breakpoint(&mut self, symbol: &str) -> Result<BreakpointSet> {
        let out = self.exec(&format!("break {}", symbol))?;
        let response = parser::parse_break_response(&out).ok_or_else(|| {
            SessionError::Debugger(
                parser::error_line(&out)
                    .unwrap_or_else(|| out.trim())
                    .to_string(),
            )
        })?;

        let set = BreakpointSet {
            number: response.number,
            symbol: symbol.to_string(),
            locations: response.locations,
            pending: response.pending,
        };
        self.breakpoints.add(set.clone());
        Ok(set)
    }

    /// Re-read the location count of a breakpoint set earlier in this session.
    pub fn refresh_breakpoint(&mut self, symbol: &str) -> Result<Option<BreakpointSet>> {
        let Some(number) = self.breakpoints.get(symbol).map(|s| s.number) else {
            return Ok(None);
        };
        let table = self.info_breakpoints()?;
        let locations = parser::resolved_locations(&table.entries, number);
        Ok(self.breakpoints.update_locations(symbol, locations).cloned())
    }

    pub fn info_breakpoints(&mut self) -> Result<BreakpointTable> {
        let raw = self.exec("info breakpoints")?;
        Ok(BreakpointTable {
            entries: parser::parse_breakpoint_table(&raw),
            raw,
        })
    }

    pub fn delete_breakpoints(&mut self) -> Result<()> {
        self.exec("delete breakpoints")?;
        self.breakpoints.clear();
        Ok(())
    }

    /// Resume and block until the process stops or exits.
    pub fn continue_execution(&mut self) -> Result<StopReason> {
        if self.state.is_terminal() {
            return Err(SessionError::Terminated);
        }
        self.require_stopped()?;
        self.resume("continue")
    }

    /// Resume until the current function returns to its caller.
    pub fn finish_current_frame(&mut self) -> Result<StopReason> {
        self.require_stopped()?;
        self.resume("finish")
    }

    /// Run the inferior again from the start.
    pub fn restart(&mut self) -> Result<StopReason> {
        if self.state.is_terminal() {
            return Err(SessionError::Terminated);
        }
        if self.state == SessionState::NotStarted {
            return Err(SessionError::NoActiveFrame);
        }
        self.resume("run")
    }

    fn resume(&mut self, command: &str) -> Result<StopReason> {
        self.ensure_alive()?;
        self.state = SessionState::Running;
        let out = self.exec_with(command, self.run_timeout)?;
        if let Some(err) = parser::leading_error(&out) {
            // nothing ran, so the process is still where it was
            self.state = SessionState::Stopped;
            return Err(SessionError::Debugger(err.to_string()));
        }
        let reason = parser::parse_stop_reason(&out);
        self.state = reason.next_state();
        tracing::info!(command, %reason, "stopped");
        Ok(reason)
    }

    /// Print `name` in the current frame. `<optimized out>` is a value.
    pub fn read_variable(&mut self, name: &str) -> Result<VariableValue> {
        self.require_stopped()?;
        let out = self.exec(&format!("print {}", name))?;
        parser::parse_print(&out).map_err(|message| SessionError::Evaluation {
            expr: name.to_string(),
            message,
        })
    }

    pub fn read_type(&mut self, name: &str) -> Result<TypeDescription> {
        self.require_stopped()?;
        let out = self.exec(&format!("ptype {}", name))?;
        parser::parse_ptype(&out).map_err(|message| SessionError::Evaluation {
            expr: name.to_string(),
            message,
        })
    }

    /// At most `depth` frames from the top of the stack.
    pub fn capture_backtrace(&mut self, depth: usize) -> Result<Backtrace> {
        self.require_stopped()?;
        let out = self.exec(&format!("backtrace {}", depth))?;
        let mut backtrace = parser::parse_backtrace(&out);
        backtrace.frames.truncate(depth);
        Ok(backtrace)
    }

    pub fn list_loaded_modules(&mut self) -> Result<Vec<LoadedModule>> {
        let out = self.exec("maintenance info objfiles")?;
        Ok(parser::parse_objfiles(&out))
    }

    pub fn list_functions(&mut self, pattern: &str) -> Result<FunctionListing> {
        let out = self.exec(&format!("info functions {}", pattern))?;
        Ok(parser::parse_function_listing(&out))
    }

    /// Load a debugger script, e.g. pretty printers and frame unwinders.
    pub fn source_script(&mut self, path: &Path) -> Result<()> {
        self.exec_checked(&format!("source {}", path.display()))?;
        Ok(())
    }

    /// Terminate the process and detach the debugger. Safe in any state and
    /// safe to call twice.
    pub fn kill(&mut self) -> Result<()> {
        if self.killed {
            return Ok(());
        }
        if self.state != SessionState::Failed {
            for command in ["delete breakpoints", "kill"] {
                if let Err(e) = self.exec(command) {
                    tracing::warn!(command, error = %e, "teardown command failed");
                    break;
                }
            }
        }
        self.killed = true;
        self.breakpoints.clear();
        if self.state != SessionState::Failed {
            self.state = SessionState::Exited;
        }
        let closed = self.channel.close();
        tracing::info!("session killed");
        closed
    }
}

impl<C: CommandChannel> Drop for DebugContext<C> {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            tracing::warn!("session teardown failed: {}", e);
        }
    }
}

/// Errors `file` prints when the image cannot be loaded.
fn load_error(output: &str) -> Option<String> {
    const MARKERS: &[&str] = &["No such file or directory", "not in executable format"];
    output
        .lines()
        .find(|l| MARKERS.iter().any(|m| l.contains(m)))
        .map(|l| l.trim().to_string())
}
