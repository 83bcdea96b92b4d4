//! Frame unwinding through deoptimized Truffle frames in a shared-library image.

use super::{continue_to_breakpoint, load_debughelpers};
use crate::config::SessionConfig;
use crate::debugger::{CommandChannel, DebugContext};
use crate::executor::assert::{assert_contains, assert_not_contains, ensure, CaseResult};
use crate::executor::runner::{no_setup, Suite, TestCase};
use crate::parser::FrameKind;

pub const PROFILED_PE_ROOT: &str = "com.oracle.truffle.runtime.OptimizedCallTarget::profiledPERoot";
pub const INVALIDATE_METHOD_OF_FRAME: &str = "com.oracle.svm.core.deopt.Deoptimizer::invalidateMethodOfFrame";
pub const DO_INVOKE: &str = "com.oracle.svm.truffle.api.SubstrateOptimizedCallTargetInstalledCode::doInvoke";

const EAGER_ARGS: &str = "(deoptFrameValues=2, __0=com.oracle.svm.truffle.api.SubstrateOptimizedCallTarget = {...}, __1=java.lang.Object[5] = {...}) at OptimizedCallTarget.java";
const RESOLVED_ARGS: &str = "(this=<optimized out>, originalArguments=com.oracle.svm.core.option.RuntimeOptionKey = {...})";
const UNKNOWN_TYPE: &str = "<unknown type in <in-memory@";

const BACKTRACE_DEPTH: usize = 5;

pub fn suite<C: CommandChannel>() -> Suite<C> {
    Suite {
        name: "runtime-deopt",
        setup: no_setup,
        cases: vec![
            TestCase::new("frame_unwinder_registration", frame_unwinder_registration),
            TestCase::new("frame_unwinder_reload", frame_unwinder_reload),
            TestCase::new("backtrace_with_deopt", backtrace_with_deopt),
            TestCase::new("type_signature_fallback_full", type_signature_fallback_full),
            TestCase::skipped(
                "type_signature_fallback_main",
                type_signature_fallback_main,
                "GDB crashes without type signature fallback here.",
            ),
        ],
    }
}

fn expect_unwinder<C: CommandChannel>(ctx: &mut DebugContext<C>) -> CaseResult {
    let unwinders = ctx.execute("info unwinder")?;
    assert_contains(&unwinders, "libjsvm.so.debug:")?;
    assert_contains(&unwinders, "SubstrateVM FrameUnwinder")
}

fn frame_unwinder_registration<C: CommandChannel>(ctx: &mut DebugContext<C>, config: &SessionConfig) -> CaseResult {
    ctx.set_breakpoint(PROFILED_PE_ROOT)?;
    continue_to_breakpoint(ctx)?;
    // the helpers need the library's symbols, which exist only from here on
    load_debughelpers(ctx, config)?;
    expect_unwinder(ctx)
}

/// The unwinder goes away with the shared library; the helpers must
/// re-register it when the library is loaded again on restart.
fn frame_unwinder_reload<C: CommandChannel>(ctx: &mut DebugContext<C>, config: &SessionConfig) -> CaseResult {
    ctx.set_breakpoint(PROFILED_PE_ROOT)?;
    continue_to_breakpoint(ctx)?;
    load_debughelpers(ctx, config)?;

    ctx.restart()?;
    expect_unwinder(ctx)
}

fn backtrace_with_deopt<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    ctx.set_breakpoint(INVALIDATE_METHOD_OF_FRAME)?;
    continue_to_breakpoint(ctx)?;
    ctx.finish_current_frame()?;

    let backtrace = ctx.capture_backtrace(BACKTRACE_DEPTH)?;
    if backtrace.has_kind(FrameKind::EagerDeopt) {
        assert_contains(&backtrace.raw, &format!("[EAGER DEOPT FRAME] {}", PROFILED_PE_ROOT))?;
        assert_contains(&backtrace.raw, EAGER_ARGS)?;
        assert_contains(&backtrace.raw, DO_INVOKE)?;
        ensure(
            !backtrace.has_kind(FrameKind::Unknown),
            format!("unresolved frame in:\n{}", backtrace.raw),
        )?;
        assert_not_contains(&backtrace.raw, "??")?;
        assert_not_contains(&backtrace.raw, "Unknown Frame at")
    } else {
        // a lazy deopt frame cannot be checked further than its tag
        ensure(
            backtrace.has_kind(FrameKind::LazyDeopt),
            format!("neither eager nor lazy deopt frame in:\n{}", backtrace.raw),
        )?;
        assert_contains(&backtrace.raw, "[LAZY DEOPT FRAME] at")
    }
}

/// The JS launcher carries no debug info, so types of the run-time compiled
/// frame must be resolved from the shared library.
fn type_signature_fallback_full<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    ctx.execute("set dwarf-type-signature-fallback full")?;
    ctx.set_breakpoint(INVALIDATE_METHOD_OF_FRAME)?;
    continue_to_breakpoint(ctx)?;

    let backtrace = ctx.capture_backtrace(BACKTRACE_DEPTH)?;
    assert_contains(&backtrace.raw, PROFILED_PE_ROOT)?;
    assert_contains(&backtrace.raw, RESOLVED_ARGS)?;
    assert_not_contains(&backtrace.raw, &format!("this={}", UNKNOWN_TYPE))
}

fn type_signature_fallback_main<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    ctx.execute("set dwarf-type-signature-fallback main")?;
    ctx.set_breakpoint(INVALIDATE_METHOD_OF_FRAME)?;
    continue_to_breakpoint(ctx)?;

    let backtrace = ctx.capture_backtrace(BACKTRACE_DEPTH)?;
    assert_contains(&backtrace.raw, PROFILED_PE_ROOT)?;
    assert_not_contains(&backtrace.raw, RESOLVED_ARGS)?;
    assert_contains(&backtrace.raw, &format!("this={}", UNKNOWN_TYPE))?;
    assert_contains(&backtrace.raw, &format!("originalArguments={}", UNKNOWN_TYPE))?;
    ensure(
        backtrace.find_function(PROFILED_PE_ROOT).is_some(),
        format!("no profiledPERoot frame in:\n{}", backtrace.raw),
    )
}
