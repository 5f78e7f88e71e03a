//! Assertion failure taxonomy.

use std::fmt;
use std::panic::Location;

use thiserror::Error;

/// Result of an assertion helper.
pub type AssertResult<T = ()> = Result<T, AssertionError>;

/// Why an assertion failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssertionKind {
    /// Expected and actual values differ.
    Mismatch,
    /// A boolean condition was false.
    Failed,
    /// The callable returned normally when an error was required.
    ExpectedErrorNotRaised,
    /// The callable raised an error of another kind.
    WrongErrorKind,
    /// The callable raised the right kind with a non-matching message.
    MessageMismatch,
}

impl AssertionKind {
    /// Taxonomy label used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            AssertionKind::Mismatch => "AssertionMismatch",
            AssertionKind::Failed => "AssertionFailed",
            AssertionKind::ExpectedErrorNotRaised => "ExpectedErrorNotRaised",
            AssertionKind::WrongErrorKind => "WrongErrorKind",
            AssertionKind::MessageMismatch => "MessageMismatch",
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source position of the failing assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub(crate) fn from_caller(location: &'static Location<'static>) -> Self {
        SourceLocation {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A failed assertion.
///
/// `expected` and `actual` are `Debug` renderings of the compared values and
/// are absent for checks that have no natural expected value (for example
/// `assert_true`).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AssertionError {
    pub kind: AssertionKind,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl AssertionError {
    /// Create a failure of `kind` with a message and no expected/actual values.
    #[cold]
    #[track_caller]
    pub fn new(kind: AssertionKind, message: impl Into<String>) -> Self {
        AssertionError {
            kind,
            expected: None,
            actual: None,
            message: message.into(),
            location: Some(SourceLocation::from_caller(Location::caller())),
        }
    }

    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Replace the recorded location (used by helpers that forward to others).
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}
