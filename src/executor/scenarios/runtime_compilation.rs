//! Breakpoints, objfiles, symbols and variables of a method that the image
//! compiles at run time and later invalidates.
//!
//! `paramMethod` is called with `(42, 27, "test", new ArrayList<>())` on a
//! holder whose field `a` starts at 11. The first stop is the AOT body, the
//! second the run-time compiled one.

use super::{continue_to_breakpoint, load_debughelpers};
use crate::config::SessionConfig;
use crate::debugger::{CommandChannel, DebugContext};
use crate::executor::assert::{
    assert_contains, assert_eq, assert_ne, assert_starts_with, ensure, CaseResult,
};
use crate::executor::runner::{no_setup, Suite, TestCase};
use crate::parser::{count_in_memory, count_occurrences, last_address, OPTIMIZED_OUT};

pub const INLINE_TEST: &str = "com.oracle.svm.test.debug.runtime.RuntimeCompilations::inlineTest";
pub const PARAM_METHOD: &str = "com.oracle.svm.test.debug.runtime.RuntimeCompilations::paramMethod";
pub const BREAK_HERE: &str = "com.oracle.svm.test.debug.runtime.RuntimeCompilations::breakHere";
pub const INVALIDATE: &str = "com.oracle.svm.graal.meta.SubstrateInstalledCodeImpl::invalidate";

pub const PARAM_METHOD_SIGNATURE: &str = "java.lang.Integer *com.oracle.svm.test.debug.runtime.RuntimeCompilations::paramMethod(java.lang.Integer*, int, java.lang.String*, java.lang.Object*);";
const HOLDER_PREFIX: &str = "com.oracle.svm.test.debug.runtime.RuntimeCompilations = {";

const PARAMS: [&str; 4] = ["param1", "param2", "param3", "param4"];
const INSPECTED: [&str; 5] = ["this", "param1", "param2", "param3", "param4"];
const TEST_STRING: &str = "\"test\"";
const EMPTY_LIST: &str = "java.util.ArrayList(0)";

/// Parameter values and holder fields after each `breakHere()` in
/// `paramMethod`. `param1` stays pinned until the last assignment.
const STEPS: [([&str; 4], [&str; 4]); 4] = [
    (
        ["42", "27", TEST_STRING, EMPTY_LIST],
        ["a = 42", "b = 0", "c = null", "d = null"],
    ),
    (
        ["42", OPTIMIZED_OUT, TEST_STRING, EMPTY_LIST],
        ["a = 42", "b = 27", "c = null", "d = null"],
    ),
    (
        ["42", OPTIMIZED_OUT, OPTIMIZED_OUT, EMPTY_LIST],
        ["a = 42", "b = 27", "c = \"test\"", "d = null"],
    ),
    (
        [OPTIMIZED_OUT, OPTIMIZED_OUT, OPTIMIZED_OUT, OPTIMIZED_OUT],
        ["a = 42", "b = 27", "c = \"test\"", "d = java.util.ArrayList(0)"],
    ),
];

/// Checks the JIT registration interface only; no type information needed.
pub fn jit_interface<C: CommandChannel>() -> Suite<C> {
    Suite {
        name: "runtime-compilation/jit-interface",
        setup: no_setup,
        cases: vec![
            TestCase::new("update_breakpoint", update_breakpoint),
            TestCase::new("load_objfile", load_objfile),
            TestCase::new("method_signature", method_signature),
        ],
    }
}

/// Checks the generated debug info of the run-time compiled method.
pub fn debug_info<C: CommandChannel>() -> Suite<C> {
    Suite {
        name: "runtime-compilation/debug-info",
        setup: debug_info_setup,
        cases: vec![
            TestCase::new("params_method_initial", params_method_initial),
            TestCase::new("param_types", param_types),
            TestCase::new("params_method", params_method),
            TestCase::new("compare_aot_to_jit", compare_aot_to_jit),
        ],
    }
}

fn debug_info_setup<C: CommandChannel>(ctx: &mut DebugContext<C>, config: &SessionConfig) -> CaseResult {
    load_debughelpers(ctx, config)?;
    ctx.execute("maintenance set dwarf type-signature-fallback main")?;
    Ok(())
}

/// Stop in the run-time compiled `paramMethod`, skipping the AOT stop.
fn run_to_jit_param_method<C: CommandChannel>(ctx: &mut DebugContext<C>) -> CaseResult {
    ctx.set_breakpoint(PARAM_METHOD)?;
    continue_to_breakpoint(ctx)?;
    continue_to_breakpoint(ctx)?;
    Ok(())
}

/// Run into the invalidation of the installed code and let it complete, which
/// unregisters the in-memory objfile.
fn run_past_invalidation<C: CommandChannel>(ctx: &mut DebugContext<C>) -> CaseResult {
    ctx.set_breakpoint(INVALIDATE)?;
    continue_to_breakpoint(ctx)?;
    ctx.finish_current_frame()?;
    Ok(())
}

fn expect_value<C: CommandChannel>(ctx: &mut DebugContext<C>, name: &str, expected: &str) -> CaseResult {
    let value = ctx.read_variable(name)?;
    if expected == OPTIMIZED_OUT {
        ensure(
            value.is_optimized_out(),
            format!("{}: expected {}, got {}", name, OPTIMIZED_OUT, value),
        )
    } else {
        assert_eq(value.as_str(), expected, name)
    }
}

fn expect_holder<C: CommandChannel>(ctx: &mut DebugContext<C>, fields: &[&str]) -> CaseResult {
    let this = ctx.read_variable("this")?;
    assert_starts_with(this.as_str(), HOLDER_PREFIX)?;
    for field in fields {
        assert_contains(this.as_str(), field)?;
    }
    Ok(())
}

fn update_breakpoint<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    let initial = ctx.set_breakpoint(INLINE_TEST)?;
    let before = ctx.info_breakpoints()?.raw;
    continue_to_breakpoint(ctx)?;

    let after = ctx.info_breakpoints()?.raw;
    ensure(
        after.len() > before.len(),
        "breakpoint listing did not grow after run-time compilation",
    )?;
    if let Some(refreshed) = ctx.refresh_breakpoint(INLINE_TEST)? {
        ensure(
            refreshed.locations > initial.locations,
            format!(
                "expected more than {} location(s), got {}",
                initial.locations, refreshed.locations
            ),
        )?;
    }

    // single and multi-location listings differ, so anchor on the old address
    let anchor = last_address(&before).unwrap_or(&before);
    assert_contains(&after, anchor)?;
    let added = after.rsplit(anchor).next().unwrap_or_default();
    assert_eq(
        count_occurrences(added, INLINE_TEST),
        1,
        "new breakpoint locations",
    )?;

    run_past_invalidation(ctx)?;
    let invalidated = ctx.info_breakpoints()?;
    assert_eq(
        invalidated.occurrences(INLINE_TEST),
        1,
        "breakpoint locations after invalidation",
    )?;
    assert_ne(
        invalidated.raw.as_str(),
        after.as_str(),
        "breakpoint listing after invalidation",
    )
}

fn load_objfile<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    let modules = ctx.list_loaded_modules()?;
    assert_eq(count_in_memory(&modules), 0, "in-memory objfiles before compilation")?;

    ctx.set_breakpoint(INLINE_TEST)?;
    continue_to_breakpoint(ctx)?;
    let modules = ctx.list_loaded_modules()?;
    ensure(
        count_in_memory(&modules) > 0,
        "no in-memory objfile registered for the run-time compilation",
    )?;

    run_past_invalidation(ctx)?;
    let modules = ctx.list_loaded_modules()?;
    assert_eq(count_in_memory(&modules), 0, "in-memory objfiles after invalidation")
}

fn method_signature<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    let before = ctx.list_functions(PARAM_METHOD)?;
    // search term, AOT symbol, deopt target symbol
    assert_eq(before.occurrences("paramMethod"), 3, "paramMethod occurrences")?;
    assert_contains(&before.raw, PARAM_METHOD_SIGNATURE)?;

    run_to_jit_param_method(ctx)?;
    let compiled = ctx.list_functions(PARAM_METHOD)?;
    assert_eq(compiled.raw.as_str(), before.raw.as_str(), "function listing after compilation")?;

    run_past_invalidation(ctx)?;
    let invalidated = ctx.list_functions(PARAM_METHOD)?;
    assert_eq(invalidated.raw.as_str(), before.raw.as_str(), "function listing after invalidation")
}

fn params_method_initial<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    run_to_jit_param_method(ctx)?;
    for (name, expected) in PARAMS.iter().zip(["42", "27", TEST_STRING, EMPTY_LIST]) {
        expect_value(ctx, name, expected)?;
    }
    expect_holder(ctx, &["a = 11", "b = 0", "c = null", "d = null"])
}

fn param_types<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    run_to_jit_param_method(ctx)?;
    assert_starts_with(
        ctx.read_type("param1")?.as_str(),
        "type = class java.lang.Integer : public java.lang.Number {",
    )?;
    assert_eq(ctx.read_type("param2")?.as_str().trim(), "type = int", "param2 type")?;
    assert_starts_with(
        ctx.read_type("param3")?.as_str(),
        "type = class java.lang.String : public java.lang.Object {",
    )?;
    assert_starts_with(
        ctx.read_type("param4")?.as_str(),
        "type = class java.lang.Object : public _objhdr {",
    )?;
    assert_starts_with(
        ctx.read_type("this")?.as_str(),
        "type = class com.oracle.svm.test.debug.runtime.RuntimeCompilations : public java.lang.Object {",
    )
}

fn params_method<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    run_to_jit_param_method(ctx)?;
    ctx.set_breakpoint(BREAK_HERE)?;

    for (params, fields) in STEPS {
        continue_to_breakpoint(ctx)?;
        ctx.finish_current_frame()?;
        for (name, expected) in PARAMS.iter().zip(params) {
            expect_value(ctx, name, expected)?;
        }
        expect_holder(ctx, &fields)?;
    }
    Ok(())
}

fn compare_aot_to_jit<C: CommandChannel>(ctx: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    ctx.set_breakpoint(PARAM_METHOD)?;
    continue_to_breakpoint(ctx)?;

    let mut aot = Vec::with_capacity(INSPECTED.len());
    for name in INSPECTED {
        aot.push((ctx.read_variable(name)?, ctx.read_type(name)?));
    }

    continue_to_breakpoint(ctx)?;
    for (name, (value, ty)) in INSPECTED.iter().zip(aot) {
        assert_eq(ctx.read_variable(name)?, value, name)?;
        assert_eq(ctx.read_type(name)?, ty, name)?;
    }
    Ok(())
}
