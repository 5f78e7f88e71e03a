//! Test runner infrastructure.
//!
//! This module provides:
//! - Registration: explicit namespaces scanned for `test_` entries
//! - Selection: name filter, tags, platform capabilities, known issues
//! - Execution: one worker thread and one fresh context per case, bounded
//!   by a timeout, sequential or on a rayon pool
//! - Reporting: results streamed to a [`Reporter`] and collected into a
//!   [`TestSummary`]


pub use case::{FnFixture, Fixture, TestCase, TestFn, TestModule, TestSuite};
pub use context::TestContext;
pub use error::{CaseResult, TestError};
pub use namespace::{discover, Namespace, TEST_PREFIX};
pub use report::{ConsoleReporter, RecordingReporter, ReportEvent, Reporter};
pub use result::{Status, TestOutcome, TestResult, TestSummary};
pub use runner::{run_case, TestRunner, TestRunnerConfig};
pub use selection::{Decision, KnownIssues, Platform, Selection, StaticPlatform};
