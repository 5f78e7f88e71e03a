//! Errors raised by the runtime under test.

use thiserror::Error;

/// An error reported by the system under test, classified by kind.
///
/// The kind is the runtime's own name for the error (`TypeError`,
/// `exceptions.AttributeError`, ...). Kinds are compared exactly.
pub trait ErrorKind {
    /// The error's kind name.
    fn kind(&self) -> &str;

    /// The error's message, without the kind prefix.
    fn message(&self) -> String;
}

/// Concrete error carrier: a kind name plus a message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{kind}: {message}")]
pub struct RaisedError {
    pub kind: String,
    pub message: String,
}

impl RaisedError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RaisedError {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Recover the raised error from an interpreter traceback.
    ///
    /// Uses the last non-empty, non-indented line, which interpreters print
    /// as `Kind: message` (or just `Kind` when there is no message).
    /// Returns `None` when that line does not start with an identifier.
    pub fn from_traceback(stderr: &str) -> Option<Self> {
        let line = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())?
            .trim_end();
        if line.starts_with(char::is_whitespace) {
            return None;
        }

        let (kind, message) = match line.split_once(':') {
            Some((kind, rest)) => (kind, rest.trim_start()),
            None => (line, ""),
        };

        if !is_kind_name(kind) {
            return None;
        }

        Some(RaisedError::new(kind, message))
    }
}

impl ErrorKind for RaisedError {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

/// Dotted identifier: `TypeError`, `exceptions.TypeError`, `System.IO.IOException`.
fn is_kind_name(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
