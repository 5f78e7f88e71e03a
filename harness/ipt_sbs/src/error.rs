use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from executing or comparing fragments.
#[derive(Debug, Error)]
pub enum SbsError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{program}` did not finish within {timeout:?} and was killed")]
    Timeout { program: String, timeout: Duration },
    #[error("invalid normalization pattern {pattern:?}: {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("no stored reference output at {}", path.display())]
    MissingBaseline { path: PathBuf },
    #[error("{0}")]
    Backend(String),
}

impl SbsError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SbsError::Timeout { .. })
    }

    /// The limit that was exceeded, for [`SbsError::Timeout`].
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            SbsError::Timeout { timeout, .. } => Some(*timeout),
            _ => None,
        }
    }
}
