use super::assert::{CaseFailure, CaseResult};
use crate::config::SessionConfig;
use crate::debugger::{CommandChannel, DebugContext};
use crate::error::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Instant;

pub type CaseFn<C> = fn(&mut DebugContext<C>, &SessionConfig) -> CaseResult;

/// One scenario. A case with `skip` set is registered but never run.
pub struct TestCase<C: CommandChannel> {
    pub name: &'static str,
    pub run: CaseFn<C>,
    pub skip: Option<&'static str>,
}

impl<C: CommandChannel> TestCase<C> {
    pub fn new(name: &'static str, run: CaseFn<C>) -> Self {
        Self {
            name,
            run,
            skip: None,
        }
    }

    pub fn skipped(name: &'static str, run: CaseFn<C>, reason: &'static str) -> Self {
        Self {
            name,
            run,
            skip: Some(reason),
        }
    }
}

/// Cases sharing a setup step, run after each fresh session starts.
pub struct Suite<C: CommandChannel> {
    pub name: &'static str,
    pub setup: CaseFn<C>,
    pub cases: Vec<TestCase<C>>,
}

pub fn no_setup<C: CommandChannel>(_: &mut DebugContext<C>, _: &SessionConfig) -> CaseResult {
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    Errored(String),
    Skipped(String),
}

impl CaseOutcome {
    fn from_result(result: CaseResult) -> Self {
        match result {
            Ok(()) => CaseOutcome::Passed,
            Err(CaseFailure::Assertion(message)) => CaseOutcome::Failed(message),
            Err(other) => CaseOutcome::Errored(other.to_string()),
        }
    }

    fn label(&self) -> String {
        match self {
            CaseOutcome::Passed => "ok".to_string(),
            CaseOutcome::Failed(_) => "FAIL".to_string(),
            CaseOutcome::Errored(_) => "ERROR".to_string(),
            CaseOutcome::Skipped(reason) => format!("skipped '{}'", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub suite: String,
    pub name: String,
    pub outcome: CaseOutcome,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Errored(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Skipped(_)))
    }

    pub fn was_successful(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.was_successful() {
            0
        } else {
            1
        }
    }

    /// Print failure details and the summary line.
    pub fn print_summary(&self, out: &mut impl Write) -> io::Result<()> {
        for case in &self.cases {
            let (kind, detail) = match &case.outcome {
                CaseOutcome::Failed(d) => ("FAIL", d),
                CaseOutcome::Errored(d) => ("ERROR", d),
                _ => continue,
            };
            writeln!(out, "{}", "=".repeat(70))?;
            writeln!(out, "{}: {} ({})", kind, case.name, case.suite)?;
            writeln!(out, "{}", "-".repeat(70))?;
            writeln!(out, "{}\n", detail)?;
        }
        writeln!(out, "{}", "-".repeat(70))?;
        writeln!(out, "Ran {} tests\n", self.cases.len())?;
        if self.was_successful() {
            write!(out, "OK")?;
        } else {
            write!(
                out,
                "FAILED (failures={}, errors={})",
                self.failed(),
                self.errored()
            )?;
        }
        if self.skipped() > 0 {
            write!(out, " (skipped={})", self.skipped())?;
        }
        writeln!(out)
    }
}

/// Runs cases one after another, each against a fresh session that is torn
/// down before the next case starts.
pub struct Runner<'a, C, F>
where
    C: CommandChannel,
    F: FnMut(&SessionConfig) -> Result<DebugContext<C>>,
{
    config: &'a SessionConfig,
    connect: F,
    filter: Option<String>,
}

impl<'a, C, F> Runner<'a, C, F>
where
    C: CommandChannel,
    F: FnMut(&SessionConfig) -> Result<DebugContext<C>>,
{
    pub fn new(config: &'a SessionConfig, connect: F) -> Self {
        Self {
            config,
            connect,
            filter: None,
        }
    }

    /// Only run cases whose `suite/name` contains `filter`.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    fn selected(&self, suite: &Suite<C>, case: &TestCase<C>) -> bool {
        match &self.filter {
            Some(f) => format!("{}/{}", suite.name, case.name).contains(f.as_str()),
            None => true,
        }
    }

    pub fn run(&mut self, suites: &[Suite<C>], out: &mut impl Write) -> io::Result<RunReport> {
        let mut report = RunReport::default();
        for suite in suites {
            for case in &suite.cases {
                if !self.selected(suite, case) {
                    continue;
                }
                write!(out, "{} ({}) ... ", case.name, suite.name)?;
                out.flush()?;

                let started = Instant::now();
                let outcome = match case.skip {
                    Some(reason) => CaseOutcome::Skipped(reason.to_string()),
                    None => self.run_case(suite, case),
                };
                writeln!(out, "{}", outcome.label())?;

                report.cases.push(CaseReport {
                    suite: suite.name.to_string(),
                    name: case.name.to_string(),
                    outcome,
                    duration_ms: started.elapsed().as_millis(),
                });
            }
        }
        Ok(report)
    }

    fn run_case(&mut self, suite: &Suite<C>, case: &TestCase<C>) -> CaseOutcome {
        tracing::info!(suite = suite.name, case = case.name, "starting case");
        let mut ctx = match (self.connect)(self.config) {
            Ok(ctx) => ctx,
            Err(e) => return CaseOutcome::Errored(e.to_string()),
        };

        let result = (suite.setup)(&mut ctx, self.config).and_then(|_| (case.run)(&mut ctx, self.config));
        let outcome = CaseOutcome::from_result(result);

        if let Err(e) = ctx.kill() {
            tracing::warn!(case = case.name, error = %e, "teardown failed");
        }
        outcome
    }
}
