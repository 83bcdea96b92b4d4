// tests/support/mod.rs
// A scripted stand-in for the GDB channel

#![allow(dead_code)]

use jit_debug_driver::config::{LaunchArgs, SessionConfig};
use jit_debug_driver::debugger::CommandChannel;
use jit_debug_driver::error::{Result, SessionError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

pub const ENTRY_STOP: &str = "Temporary breakpoint 1 at 0x401136: file m.c, line 4.\n\nTemporary breakpoint 1, main () at m.c:4\n4\t  return run(argc, argv);\n";
pub const EXITED: &str = "[Inferior 1 (process 4242) exited normally]\n";

#[derive(Debug, Clone)]
pub enum Reply {
    Output(String),
    Hang,
    Closed,
}

/// Everything the driver did to the channel; shared so it outlives the context.
#[derive(Debug, Default)]
pub struct Transcript {
    pub commands: Vec<String>,
    pub closes: usize,
}

impl Transcript {
    pub fn position(&self, command: &str) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands.iter().filter(|c| c.as_str() == command).count()
    }
}

/// Replies by command prefix. A rule with several replies hands them out in
/// order and repeats the last one. Unmatched commands print nothing.
pub struct ScriptedChannel {
    rules: Vec<(String, VecDeque<Reply>)>,
    transcript: Rc<RefCell<Transcript>>,
    closed: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::with_transcript(Rc::new(RefCell::new(Transcript::default())))
    }

    pub fn with_transcript(transcript: Rc<RefCell<Transcript>>) -> Self {
        Self {
            rules: Vec::new(),
            transcript,
            closed: false,
        }
        .on("start", ENTRY_STOP)
        .on("file ", "Reading symbols from /opt/images/runtimecompilation...\n")
    }

    pub fn on(self, prefix: &str, output: &str) -> Self {
        self.reply(prefix, Reply::Output(output.to_string()))
    }

    /// Later rules for the same prefix replace earlier ones; repeated calls
    /// with [`ScriptedChannel::then`] queue further replies.
    pub fn reply(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.retain(|(p, _)| p != prefix);
        self.rules.push((prefix.to_string(), VecDeque::from([reply])));
        self
    }

    pub fn then(mut self, prefix: &str, output: &str) -> Self {
        match self.rules.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, replies)) => replies.push_back(Reply::Output(output.to_string())),
            None => return self.on(prefix, output),
        }
        self
    }

    pub fn transcript(&self) -> Rc<RefCell<Transcript>> {
        Rc::clone(&self.transcript)
    }

    fn next_reply(&mut self, command: &str) -> Reply {
        let rule = self
            .rules
            .iter_mut()
            .filter(|(p, _)| command.starts_with(p.as_str()))
            .max_by_key(|(p, _)| p.len());
        match rule {
            Some((_, replies)) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some((_, replies)) => replies.front().cloned().unwrap(),
            None => Reply::Output(String::new()),
        }
    }
}

impl CommandChannel for ScriptedChannel {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String> {
        if self.closed {
            return Err(SessionError::ChannelClosed);
        }
        self.transcript.borrow_mut().commands.push(command.to_string());
        match self.next_reply(command) {
            Reply::Output(out) => Ok(out),
            Reply::Hang => Err(SessionError::Timeout {
                command: command.to_string(),
                timeout,
            }),
            Reply::Closed => {
                self.closed = true;
                Err(SessionError::ChannelClosed)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.transcript.borrow_mut().closes += 1;
        self.closed = true;
        Ok(())
    }
}

pub fn config() -> SessionConfig {
    SessionConfig {
        target: PathBuf::from("/opt/images/runtimecompilation"),
        args: LaunchArgs::List(vec!["-Xmx1g".to_string(), "hello world".to_string()]),
        command_timeout_secs: 5,
        run_timeout_secs: 5,
        ..SessionConfig::default()
    }
}
