//! Assertion helpers for runtime conformance tests.
//!
//! Every helper turns a condition into `Ok(..)` or an [`AssertionError`]
//! describing why the check failed. Helpers never print or log; the test
//! runner decides how a failure is reported.
//!
//! ```text
//! fn test_bool_ops(_ctx: &mut TestContext) -> CaseResult {
//!     assert_eq(true as i32 + 1, 2)?;
//!     assert_raises("ZeroDivisionError", || runtime.eval("1/0"))?;
//!     Ok(())
//! }
//! ```
//!
//! Failures carry the caller's source location via `#[track_caller]`, so the
//! report points at the test line rather than at this crate.

mod checks;
mod error;
mod raised;

pub use checks::{
    assert_almost_eq, assert_contains, assert_eq, assert_ne, assert_raises,
    assert_raises_matching, assert_true, fail,
};
pub use error::{AssertResult, AssertionError, AssertionKind, SourceLocation};
pub use raised::{ErrorKind, RaisedError};
