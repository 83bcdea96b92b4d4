use crate::error::{Result, SessionError};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const SENTINEL: &str = "__JDD_DONE__";
const PROMPT: &str = "(gdb) ";
const QUIT_GRACE: Duration = Duration::from_secs(3);

/// A textual command/response channel to a debugger.
pub trait CommandChannel {
    /// Send one command and return everything the debugger printed for it.
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String>;

    /// Make the debugger exit. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// A GDB child process whose stdout and stderr are read as one stream.
pub struct GdbSession {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    closed: bool,
}

impl GdbSession {
    pub fn start(gdb: &Path, handshake_timeout: Duration) -> Result<Self> {
        // exec through sh so stderr shares the stdout pipe and keeps its ordering
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("exec \"$0\" \"$@\" 2>&1")
            .arg(gdb)
            .args(["--nx", "--quiet"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SessionError::SessionStart(format!("cannot spawn debugger: {}", e)))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::SessionStart("debugger has no stdout".to_string()))?;

        let (tx, rx) = channel();
        // the reader is detached: a surviving inferior may keep the pipe open
        thread::spawn(move || {
            let mut stdout = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match stdout.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.clone()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut session = Self {
            child,
            stdin,
            lines: rx,
            closed: false,
        };

        // the prompt is noise on a pipe, and an empty marker round-trip proves
        // the debugger is alive
        match session.run("set prompt", handshake_timeout) {
            Ok(_) => Ok(session),
            Err(e) => {
                let _ = session.close();
                Err(SessionError::SessionStart(format!(
                    "debugger `{}` did not answer: {}",
                    gdb.display(),
                    e
                )))
            }
        }
    }

    fn send(&mut self, text: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(SessionError::ChannelClosed)?;
        stdin
            .write_all(text.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(|e| match e.kind() {
                io::ErrorKind::BrokenPipe => SessionError::ChannelClosed,
                _ => SessionError::Io(e),
            })
    }

    fn wait_with_grace(&mut self) -> Result<()> {
        let start = Instant::now();
        while start.elapsed() < QUIT_GRACE {
            if self.child.try_wait()?.is_some() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(50));
        }
        tracing::warn!("debugger ignored quit, killing it");
        match self.child.kill() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e.into()),
        }
        self.child.wait()?;
        Ok(())
    }
}

impl CommandChannel for GdbSession {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String> {
        if self.closed {
            return Err(SessionError::ChannelClosed);
        }
        tracing::debug!(command, "gdb <-");
        self.send(&format!("{}\necho {}\\n\n", command, SENTINEL))?;

        let mut output = String::new();
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = match self.lines.recv_timeout(remaining) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(SessionError::Timeout {
                        command: command.to_string(),
                        timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::trace!(output = %output, "gdb output before close");
                    return Err(SessionError::ChannelClosed);
                }
            };

            let mut text = line.as_str();
            while let Some(rest) = text.strip_prefix(PROMPT) {
                text = rest;
            }
            if let Some(idx) = text.find(SENTINEL) {
                output.push_str(&text[..idx]);
                break;
            }
            output.push_str(text);
        }

        tracing::trace!(output = %output, "gdb ->");
        Ok(output)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.child.try_wait()?.is_none() {
            let _ = self.send("quit\n");
        }
        self.stdin = None;
        self.wait_with_grace()
    }
}

impl Drop for GdbSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("debugger teardown failed: {}", e);
        }
    }
}
