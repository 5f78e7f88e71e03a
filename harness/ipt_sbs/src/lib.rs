//! Side-by-side (SBS) comparison.
//!
//! Runs the same code fragment under a reference runtime and a candidate
//! runtime, normalizes both outputs, and diffs them line by line.
//!
//! ```text
//! fragment ──► reference.execute() ──► normalize ──┐
//!     │                                            ├──► line_diff ──► Verdict
//!     └──────► candidate.execute() ──► normalize ──┘
//! ```
//!
//! Runtimes are reached through the [`ExternalRunner`] trait so the
//! comparator can be exercised with in-process fakes ([`FnRunner`]) as well
//! as real interpreters ([`ProcessRunner`]). A [`LogDir`] keeps each
//! fragment's outputs on disk and can stand in for the reference runtime.

mod compare;
mod diff;
mod error;
mod logs;
mod normalize;
mod runner;

pub use compare::{BatchReport, CompareOptions, Comparator, ComparisonRecord, Verdict};
pub use diff::{line_diff, DiffLine, Hunk, LineDiff};
pub use error::SbsError;
pub use logs::LogDir;
pub use normalize::{NormalizationRule, Normalizer};
pub use runner::{run_with_timeout, Execution, ExternalRunner, FnRunner, InputMode, ProcessRunner};
