//! The assertion helpers.

use std::fmt::Debug;

use regex::Regex;

use crate::error::{AssertResult, AssertionError, AssertionKind};
use crate::raised::ErrorKind;

/// Fail unconditionally with `AssertionFailed`.
#[cold]
#[track_caller]
pub fn fail(message: impl Into<String>) -> AssertionError {
    AssertionError::new(AssertionKind::Failed, message)
}

/// Check `actual == expected`.
#[track_caller]
pub fn assert_eq<A, E>(actual: A, expected: E) -> AssertResult
where
    A: PartialEq<E> + Debug,
    E: Debug,
{
    if actual == expected {
        return Ok(());
    }
    Err(
        AssertionError::new(
            AssertionKind::Mismatch,
            format!("expected {expected:?}, got {actual:?}"),
        )
        .with_expected(format!("{expected:?}"))
        .with_actual(format!("{actual:?}")),
    )
}

/// Check `actual != unexpected`.
#[track_caller]
pub fn assert_ne<A, E>(actual: A, unexpected: E) -> AssertResult
where
    A: PartialEq<E> + Debug,
    E: Debug,
{
    if actual != unexpected {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::Mismatch,
        format!("expected a value other than {unexpected:?}"),
    )
    .with_actual(format!("{actual:?}")))
}

/// Check `|actual - expected| <= tolerance`.
///
/// Two NaNs compare almost-equal; a NaN against a number never does.
#[track_caller]
pub fn assert_almost_eq(actual: f64, expected: f64, tolerance: f64) -> AssertResult {
    let close = if actual.is_nan() || expected.is_nan() {
        actual.is_nan() && expected.is_nan()
    } else {
        actual == expected || (actual - expected).abs() <= tolerance
    };
    if close {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::Mismatch,
        format!("expected {expected} (within {tolerance}), got {actual}"),
    )
    .with_expected(format!("{expected}"))
    .with_actual(format!("{actual}")))
}

/// Check a boolean condition.
#[track_caller]
pub fn assert_true(condition: bool, message: impl Into<String>) -> AssertResult {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::new(AssertionKind::Failed, message))
    }
}

/// Check that `needle` is one of `haystack`'s elements.
#[track_caller]
pub fn assert_contains<T>(haystack: &[T], needle: &T) -> AssertResult
where
    T: PartialEq + Debug,
{
    if haystack.contains(needle) {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::Failed,
        format!("{needle:?} not found among {} element(s)", haystack.len()),
    )
    .with_expected(format!("{needle:?}")))
}

/// Call `f` and require it to fail with an error of exactly `kind`.
///
/// Returns the caught error so the test can inspect it further.
#[track_caller]
pub fn assert_raises<T, E, F>(kind: &str, f: F) -> AssertResult<E>
where
    T: Debug,
    E: ErrorKind,
    F: FnOnce() -> Result<T, E>,
{
    match f() {
        Ok(value) => Err(AssertionError::new(
            AssertionKind::ExpectedErrorNotRaised,
            format!("expected {kind} to be raised, but the call returned {value:?}"),
        )
        .with_expected(kind)
        .with_actual(format!("{value:?}"))),
        Err(error) if error.kind() != kind => Err(AssertionError::new(
            AssertionKind::WrongErrorKind,
            format!(
                "expected {kind}, got {}: {}",
                error.kind(),
                error.message()
            ),
        )
        .with_expected(kind)
        .with_actual(error.kind())),
        Err(error) => Ok(error),
    }
}

/// Like [`assert_raises`], and additionally require the error message to
/// match the regular expression `pattern` (unanchored search).
#[track_caller]
pub fn assert_raises_matching<T, E, F>(kind: &str, pattern: &str, f: F) -> AssertResult<E>
where
    T: Debug,
    E: ErrorKind,
    F: FnOnce() -> Result<T, E>,
{
    // Not `map_err`: closures drop the `#[track_caller]` location.
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            return Err(AssertionError::new(
                AssertionKind::Failed,
                format!("invalid message pattern {pattern:?}: {e}"),
            ))
        }
    };

    let error = assert_raises(kind, f)?;
    let message = error.message();
    if regex.is_match(&message) {
        return Ok(error);
    }
    Err(AssertionError::new(
        AssertionKind::MessageMismatch,
        format!("{kind} message {message:?} does not match {pattern:?}"),
    )
    .with_expected(pattern)
    .with_actual(message))
}
