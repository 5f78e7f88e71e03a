//! Conformance test harness for alternate language runtimes.
//!
//! - [`test`]: registration, selection, isolated execution, reporting
//! - [`suites`]: script and side-by-side modules backed by files on disk
//! - [`registry`]: every known module, resolved by module or category name
//! - [`config`]: `iptest.toml`
//! - [`commands`]: the CLI commands built on the above
//!
//! Assertions live in `ipt_assert`, category manifests in `ipt_manifest`,
//! and cross-runtime comparison in `ipt_sbs`; the most used items are
//! re-exported here.

pub mod commands;
pub mod config;
pub mod registry;
pub mod suites;
pub mod test;

pub use ipt_assert::{
    assert_almost_eq, assert_contains, assert_eq, assert_ne, assert_raises, assert_raises_matching,
    assert_true, fail, AssertionError, AssertionKind, ErrorKind, RaisedError,
};
pub use ipt_manifest::CategoryManifest;
pub use ipt_sbs::{Comparator, ExternalRunner, ProcessRunner, Verdict};
pub use test::{
    CaseResult, Namespace, TestCase, TestContext, TestError, TestOutcome, TestResult, TestRunner,
    TestRunnerConfig, TestSuite, TestSummary,
};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set, so report output stays clean.
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_writer(std::io::stderr)
                        .with_targets(true),
                )
                .with(filter)
                .init();
        }
    });
}
