use crate::error::SessionError;
use std::fmt::Debug;
use thiserror::Error;

/// Why a case did not pass.
#[derive(Debug, Error)]
pub enum CaseFailure {
    /// Expected and actual debugger output disagree.
    #[error("{0}")]
    Assertion(String),

    /// The session itself failed; reported as an error, not a failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The case cannot run in this environment.
    #[error("setup: {0}")]
    Setup(String),
}

pub type CaseResult = Result<(), CaseFailure>;

pub fn ensure(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseFailure::Assertion(message.into()))
    }
}

pub fn assert_eq<T: PartialEq + Debug>(actual: T, expected: T, what: &str) -> CaseResult {
    ensure(
        actual == expected,
        format!("{}: expected {:?}, got {:?}", what, expected, actual),
    )
}

pub fn assert_ne<T: PartialEq + Debug>(actual: T, unexpected: T, what: &str) -> CaseResult {
    ensure(
        actual != unexpected,
        format!("{}: did not expect {:?}", what, unexpected),
    )
}

pub fn assert_contains(haystack: &str, needle: &str) -> CaseResult {
    ensure(
        haystack.contains(needle),
        format!("expected {:?} in:\n{}", needle, haystack),
    )
}

pub fn assert_not_contains(haystack: &str, needle: &str) -> CaseResult {
    ensure(
        !haystack.contains(needle),
        format!("did not expect {:?} in:\n{}", needle, haystack),
    )
}

pub fn assert_starts_with(text: &str, prefix: &str) -> CaseResult {
    ensure(
        text.starts_with(prefix),
        format!("expected prefix {:?}, got:\n{}", prefix, text),
    )
}
