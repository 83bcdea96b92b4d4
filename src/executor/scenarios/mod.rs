//! Fixture suites for run-time compiled code and deoptimization.

pub mod runtime_compilation;
pub mod runtime_deopt;

use super::assert::{CaseFailure, CaseResult};
use super::runner::Suite;
use crate::config::SessionConfig;
use crate::debugger::{CommandChannel, DebugContext, StopReason};

/// Every suite, in execution order.
pub fn all<C: CommandChannel>() -> Vec<Suite<C>> {
    vec![
        runtime_compilation::jit_interface(),
        runtime_compilation::debug_info(),
        runtime_deopt::suite(),
    ]
}

/// Suites whose name starts with `prefix`.
pub fn select<C: CommandChannel>(prefix: &str) -> Vec<Suite<C>> {
    all()
        .into_iter()
        .filter(|s| s.name.starts_with(prefix))
        .collect()
}

/// Continue and require a breakpoint stop.
pub(crate) fn continue_to_breakpoint<C: CommandChannel>(
    ctx: &mut DebugContext<C>,
) -> Result<StopReason, CaseFailure> {
    let reason = ctx.continue_execution()?;
    if !reason.is_breakpoint() {
        return Err(CaseFailure::Assertion(format!(
            "expected a breakpoint stop, got {}",
            reason
        )));
    }
    Ok(reason)
}

/// Source the configured helper script.
pub(crate) fn load_debughelpers<C: CommandChannel>(
    ctx: &mut DebugContext<C>,
    config: &SessionConfig,
) -> CaseResult {
    let path = config
        .debughelpers
        .as_deref()
        .ok_or_else(|| CaseFailure::Setup("`debughelpers` is not configured".to_string()))?;
    ctx.source_script(path)?;
    Ok(())
}
