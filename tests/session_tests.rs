// tests/session_tests.rs
// Drives DebugContext against a scripted debugger channel

mod support;

use jit_debug_driver::config::SessionConfig;
use jit_debug_driver::debugger::{DebugContext, SessionState, StopReason};
use jit_debug_driver::error::SessionError;
use jit_debug_driver::parser::{FrameKind, VariableValue};
use std::path::Path;
use support::{config, Reply, ScriptedChannel, EXITED};

const PENDING: &str = "Function \"com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest\" not defined.\nBreakpoint 2 (com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest) pending.\n";
const FANNED_OUT: &str = "\
Num     Type           Disp Enb Address            What
2       breakpoint     keep y   <MULTIPLE>
2.1                         y   0x0000000000427c10 in com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest at RuntimeCompileDebugInfoTest.java:69
2.2                         y   0x00007fffe80a1040 in com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest at RuntimeCompileDebugInfoTest.java:69
";
const JIT_STOP: &str = "\nThread 1 \"runtimecompilat\" hit Breakpoint 2.2, com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest () at RuntimeCompileDebugInfoTest.java:69\n69\t        return a;\n";

#[cfg(test)]
mod launch_tests {
    use super::*;

    #[test]
    fn test_prepares_debugger_before_start() {
        let channel = ScriptedChannel::new();
        let transcript = channel.transcript();
        let mut cfg = config();
        cfg.env.insert("LANG".to_string(), "C".to_string());
        cfg.init_commands.push("set debuginfod enabled off".to_string());

        let ctx = DebugContext::launch(channel, &cfg).expect("launch should succeed");
        assert_eq!(ctx.state(), SessionState::Stopped);

        let t = transcript.borrow();
        let pagination = t.position("set pagination off").unwrap();
        let file = t.position("file /opt/images/runtimecompilation").unwrap();
        let delete = t.position("delete breakpoints").unwrap();
        let env = t.position("set environment LANG=C").unwrap();
        let init = t.position("set debuginfod enabled off").unwrap();
        let start = t.position("start").unwrap();
        assert!(pagination < file);
        assert!(file < delete);
        assert!(delete < env);
        assert!(env < init);
        assert!(init < start);

        let set_args = t
            .commands
            .iter()
            .find(|c| c.starts_with("set args "))
            .unwrap();
        let args = shlex::split(&set_args["set args ".len()..]).unwrap();
        assert_eq!(args, vec!["-Xmx1g", "hello world"]);
    }

    #[test]
    fn test_run_without_entry_stop() {
        let channel = ScriptedChannel::new().on("run", EXITED);
        let transcript = channel.transcript();
        let cfg = SessionConfig {
            stop_at_entry: false,
            ..config()
        };

        let ctx = DebugContext::launch(channel, &cfg).unwrap();
        assert_eq!(ctx.state(), SessionState::Exited);
        assert!(transcript.borrow().position("start").is_none());
    }

    #[test]
    fn test_missing_entry_stop_is_start_error() {
        let channel = ScriptedChannel::new().on("start", EXITED);
        let transcript = channel.transcript();

        let err = DebugContext::launch(channel, &config()).err().unwrap();
        assert!(matches!(err, SessionError::SessionStart(_)));
        assert_eq!(transcript.borrow().closes, 1);
    }

    #[test]
    fn test_unloadable_image_is_start_error() {
        let channel = ScriptedChannel::new().on(
            "file ",
            "/opt/images/runtimecompilation: No such file or directory.\n",
        );
        let transcript = channel.transcript();

        match DebugContext::launch(channel, &config()) {
            Err(SessionError::SessionStart(message)) => {
                assert!(message.contains("No such file or directory"))
            }
            other => panic!("expected a start error, got {:?}", other.err()),
        }
        let t = transcript.borrow();
        assert!(t.position("start").is_none());
        assert_eq!(t.closes, 1);
    }

    #[test]
    fn test_unresponsive_debugger_is_start_error() {
        let channel = ScriptedChannel::new().reply("set pagination", Reply::Closed);

        let err = DebugContext::launch(channel, &config()).err().unwrap();
        assert!(matches!(err, SessionError::SessionStart(_)));
    }

    #[test]
    fn test_missing_target_is_rejected_before_spawning() {
        let cfg = SessionConfig {
            gdb: "/nonexistent/gdb".into(),
            target: "/nonexistent/image".into(),
            ..SessionConfig::default()
        };
        let err = DebugContext::start(&cfg).err().unwrap();
        match err {
            SessionError::SessionStart(message) => assert!(message.contains("/nonexistent/image")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_debugger_is_start_error() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let cfg = SessionConfig {
            gdb: "/nonexistent/gdb".into(),
            target: image.path().to_path_buf(),
            command_timeout_secs: 5,
            ..SessionConfig::default()
        };
        let err = DebugContext::start(&cfg).err().unwrap();
        assert!(matches!(err, SessionError::SessionStart(_)));
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    fn exited_session() -> DebugContext<ScriptedChannel> {
        let channel = ScriptedChannel::new().on("run", EXITED);
        let cfg = SessionConfig {
            stop_at_entry: false,
            ..config()
        };
        DebugContext::launch(channel, &cfg).unwrap()
    }

    #[test]
    fn test_frame_commands_need_a_stopped_process() {
        let mut ctx = exited_session();
        assert!(matches!(
            ctx.finish_current_frame(),
            Err(SessionError::NoActiveFrame)
        ));
        assert!(matches!(
            ctx.read_variable("param1"),
            Err(SessionError::NoActiveFrame)
        ));
        assert!(matches!(ctx.read_type("this"), Err(SessionError::NoActiveFrame)));
        assert!(matches!(
            ctx.capture_backtrace(5),
            Err(SessionError::NoActiveFrame)
        ));
    }

    #[test]
    fn test_continue_after_exit_is_terminated() {
        let mut ctx = exited_session();
        assert!(matches!(
            ctx.continue_execution(),
            Err(SessionError::Terminated)
        ));
    }

    #[test]
    fn test_restart_after_exit_is_terminated() {
        let channel = ScriptedChannel::new().on("run", EXITED);
        let transcript = channel.transcript();
        let cfg = SessionConfig {
            stop_at_entry: false,
            ..config()
        };
        let mut ctx = DebugContext::launch(channel, &cfg).unwrap();
        assert_eq!(ctx.state(), SessionState::Exited);

        assert!(matches!(ctx.restart(), Err(SessionError::Terminated)));
        assert_eq!(ctx.state(), SessionState::Exited);
        assert_eq!(transcript.borrow().count("run"), 1);
    }

    #[test]
    fn test_continue_to_breakpoint_then_exit() {
        let channel = ScriptedChannel::new()
            .on("continue", JIT_STOP)
            .then("continue", EXITED);
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        let reason = ctx.continue_execution().unwrap();
        assert!(reason.is_breakpoint());
        assert_eq!(ctx.state(), SessionState::Stopped);

        let reason = ctx.continue_execution().unwrap();
        assert_eq!(reason, StopReason::Exited { code: 0 });
        assert_eq!(ctx.state(), SessionState::Exited);
    }

    #[test]
    fn test_finish_reports_frame_finished() {
        let channel = ScriptedChannel::new().on(
            "finish",
            "Run till exit from #0  com.example::breakHere () at T.java:3\ncom.example::paramMethod () at T.java:9\n",
        );
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        let reason = ctx.finish_current_frame().unwrap();
        assert_eq!(reason, StopReason::FrameFinished { returned: None });
        assert_eq!(ctx.state(), SessionState::Stopped);
    }

    #[test]
    fn test_rejected_finish_keeps_process_stopped() {
        let channel = ScriptedChannel::new().on(
            "finish",
            "\"finish\" not meaningful in the outermost frame.\n",
        );
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        assert!(matches!(
            ctx.finish_current_frame(),
            Err(SessionError::Debugger(_))
        ));
        assert_eq!(ctx.state(), SessionState::Stopped);
    }

    #[test]
    fn test_timeout_fails_the_session() {
        let channel = ScriptedChannel::new().reply("continue", Reply::Hang);
        let transcript = channel.transcript();
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        assert!(matches!(
            ctx.continue_execution(),
            Err(SessionError::Timeout { .. })
        ));
        assert_eq!(ctx.state(), SessionState::Failed);
        assert!(matches!(ctx.execute("info frame"), Err(SessionError::Terminated)));

        let issued = transcript.borrow().commands.len();
        ctx.kill().unwrap();
        assert_eq!(ctx.state(), SessionState::Failed);
        let t = transcript.borrow();
        assert_eq!(t.commands.len(), issued);
        assert_eq!(t.closes, 1);
    }
}

#[cfg(test)]
mod inspection_tests {
    use super::*;

    #[test]
    fn test_optimized_out_is_a_value() {
        let channel = ScriptedChannel::new()
            .on("print param1", "$1 = 42\n")
            .on("print param2", "$2 = <optimized out>\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        assert_eq!(
            ctx.read_variable("param1").unwrap(),
            VariableValue::Available("42".to_string())
        );
        let value = ctx.read_variable("param2").unwrap();
        assert!(value.is_optimized_out());
        assert_eq!(value, VariableValue::OptimizedOut);
    }

    #[test]
    fn test_unknown_symbol_is_evaluation_error() {
        let channel =
            ScriptedChannel::new().on("print nosuch", "No symbol \"nosuch\" in current context.\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        match ctx.read_variable("nosuch") {
            Err(SessionError::Evaluation { expr, message }) => {
                assert_eq!(expr, "nosuch");
                assert!(message.starts_with("No symbol"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ctx.state(), SessionState::Stopped);
    }

    #[test]
    fn test_source_script() {
        let channel = ScriptedChannel::new()
            .on("source /opt/images/gdb-debughelpers.py", "SubstrateVM FrameUnwinder registered\n")
            .on("source /opt/missing.py", "/opt/missing.py: No such file or directory.\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        ctx.source_script(Path::new("/opt/images/gdb-debughelpers.py"))
            .unwrap();
        assert!(matches!(
            ctx.source_script(Path::new("/opt/missing.py")),
            Err(SessionError::Debugger(_))
        ));
        assert_eq!(ctx.state(), SessionState::Stopped);
    }

    #[test]
    fn test_rejected_command_is_debugger_error() {
        let channel = ScriptedChannel::new()
            .on(
                "maintenance set dwarf",
                "Undefined maintenance set command: \"dwarf type-signature-fallback main\".  Try \"help maintenance set\".\n",
            )
            .on("info unwinder", "Global:\n  libjsvm.so.debug:\n    SubstrateVM FrameUnwinder\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        match ctx.execute("maintenance set dwarf type-signature-fallback main") {
            Err(SessionError::Debugger(message)) => {
                assert!(message.starts_with("Undefined maintenance set command"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ctx.state(), SessionState::Stopped);
        assert!(ctx.execute("info unwinder").unwrap().contains("SubstrateVM FrameUnwinder"));
    }

    #[test]
    fn test_value_after_debugger_warnings() {
        let channel = ScriptedChannel::new().on(
            "print param1",
            "warning: Python pretty-printer raised an exception\n$1 = 42\n",
        );
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        assert_eq!(
            ctx.read_variable("param1").unwrap(),
            VariableValue::Available("42".to_string())
        );
    }

    #[test]
    fn test_type_keeps_prefix() {
        let channel = ScriptedChannel::new().on("ptype param2", "type = int\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();
        assert_eq!(ctx.read_type("param2").unwrap().as_str().trim(), "type = int");
    }

    #[test]
    fn test_backtrace_is_limited_to_depth() {
        let trace = "\
#0  com.oracle.svm.core.deopt.Deoptimizer::invalidateMethodOfFrame (sourceSp=...) at Deoptimizer.java:512
#1  0x00007ffff6c1b2c3 in [EAGER DEOPT FRAME] com.oracle.truffle.runtime.OptimizedCallTarget::profiledPERoot (deoptFrameValues=2) at OptimizedCallTarget.java:1243
#2  [LAZY DEOPT FRAME] at 0x7ffff6c1b000
(More stack frames follow...)
";
        let channel = ScriptedChannel::new().on("backtrace 2", trace);
        let transcript = channel.transcript();
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        let bt = ctx.capture_backtrace(2).unwrap();
        assert_eq!(bt.frames.len(), 2);
        assert!(bt.has_kind(FrameKind::EagerDeopt));
        assert!(!bt.has_kind(FrameKind::LazyDeopt));
        assert!(transcript.borrow().position("backtrace 2").is_some());
    }

    #[test]
    fn test_in_memory_modules() {
        let listing = "\
Object file /opt/images/runtimecompilation:  Objfile at 0x5555561d2a10, bfd at 0x5555561c6f60, 48211 minsyms

Object file <in-memory@0x7fffe80a1000>:  Objfile at 0x5555570e2400, bfd at 0x555556f11c90, 0 minsyms
";
        let channel = ScriptedChannel::new().on("maintenance info objfiles", listing);
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        let modules = ctx.list_loaded_modules().unwrap();
        assert_eq!(modules.len(), 2);
        assert!(!modules[0].in_memory);
        assert!(modules[1].in_memory);
    }
}

#[cfg(test)]
mod breakpoint_tests {
    use super::*;

    const SYMBOL: &str = "com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest";

    #[test]
    fn test_pending_breakpoint_fans_out() {
        let channel = ScriptedChannel::new()
            .on("break ", PENDING)
            .on("info breakpoints", FANNED_OUT);
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        let set = ctx.set_breakpoint(SYMBOL).unwrap();
        assert!(set.pending);
        assert_eq!(set.locations, 0);
        assert_eq!(set.number, 2);

        let refreshed = ctx.refresh_breakpoint(SYMBOL).unwrap().unwrap();
        assert!(!refreshed.pending);
        assert_eq!(refreshed.locations, 2);
        assert_eq!(ctx.breakpoints().get(SYMBOL).unwrap().locations, 2);
    }

    #[test]
    fn test_refresh_of_unknown_symbol() {
        let mut ctx = DebugContext::launch(ScriptedChannel::new(), &config()).unwrap();
        assert!(ctx.refresh_breakpoint(SYMBOL).unwrap().is_none());
    }

    #[test]
    fn test_delete_breakpoints_clears_registry() {
        let channel = ScriptedChannel::new()
            .on("break ", "Breakpoint 3 at 0x427c10: file RuntimeCompileDebugInfoTest.java, line 69.\n");
        let transcript = channel.transcript();
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        ctx.set_breakpoint(SYMBOL).unwrap();
        ctx.set_breakpoint("com.oracle.svm.graal.meta.SubstrateInstalledCodeImpl::invalidate")
            .unwrap();
        assert_eq!(ctx.breakpoints().len(), 2);
        assert!(ctx.breakpoints().iter().all(|b| !b.pending && b.locations == 1));

        ctx.delete_breakpoints().unwrap();
        assert!(ctx.breakpoints().is_empty());
        // once while preparing the launch, once here
        assert_eq!(transcript.borrow().count("delete breakpoints"), 2);
    }

    #[test]
    fn test_rejected_breakpoint_is_debugger_error() {
        let channel = ScriptedChannel::new().on("break ", "No symbol table is loaded.\n");
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();

        match ctx.set_breakpoint("nosuch") {
            Err(SessionError::Debugger(message)) => {
                assert_eq!(message, "No symbol table is loaded.")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.breakpoints().is_empty());
    }
}

#[cfg(test)]
mod teardown_tests {
    use super::*;

    #[test]
    fn test_kill_is_idempotent() {
        let channel = ScriptedChannel::new().on("break ", PENDING);
        let transcript = channel.transcript();
        let mut ctx = DebugContext::launch(channel, &config()).unwrap();
        ctx.set_breakpoint("com.example::inlineTest").unwrap();

        ctx.kill().unwrap();
        ctx.kill().unwrap();
        assert_eq!(ctx.state(), SessionState::Exited);
        assert!(ctx.breakpoints().is_empty());
        assert!(matches!(ctx.execute("info frame"), Err(SessionError::Terminated)));

        let t = transcript.borrow();
        assert_eq!(t.count("kill"), 1);
        assert_eq!(t.closes, 1);
        let last: Vec<&str> = t.commands.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(last, vec!["kill", "delete breakpoints"]);
    }

    #[test]
    fn test_drop_tears_down() {
        let channel = ScriptedChannel::new();
        let transcript = channel.transcript();
        {
            let _ctx = DebugContext::launch(channel, &config()).unwrap();
        }
        let t = transcript.borrow();
        assert_eq!(t.count("kill"), 1);
        assert_eq!(t.closes, 1);
    }

    #[test]
    fn test_restart_after_kill_is_terminated() {
        let mut ctx = DebugContext::launch(ScriptedChannel::new(), &config()).unwrap();
        ctx.kill().unwrap();
        assert!(matches!(ctx.restart(), Err(SessionError::Terminated)));
    }
}
