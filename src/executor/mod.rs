pub mod assert;
mod runner;
pub mod scenarios;

pub use assert::{CaseFailure, CaseResult};
pub use runner::{no_setup, CaseFn, CaseOutcome, CaseReport, RunReport, Runner, Suite, TestCase};
