use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::test::case::FnFixture;
use crate::test::error::CaseResult;
use crate::test::namespace::{discover, Namespace};
use crate::test::report::{RecordingReporter, ReportEvent};
use crate::test::result::{Status, TestOutcome};
use crate::test::selection::StaticPlatform;
use ipt_assert::{assert_eq as check_eq, assert_true, AssertionKind};
use pretty_assertions::assert_eq;

static HELPER_CALLED: AtomicBool = AtomicBool::new(false);

fn test_a(_ctx: &mut TestContext) -> CaseResult {
    check_eq(1 + 1, 2)?;
    Ok(())
}

fn test_b(_ctx: &mut TestContext) -> CaseResult {
    check_eq(1 + 1, 3)?;
    Ok(())
}

fn helper_c(_ctx: &mut TestContext) -> CaseResult {
    HELPER_CALLED.store(true, Ordering::SeqCst);
    Ok(())
}

fn quick() -> TestRunner {
    TestRunner::with_config(TestRunnerConfig {
        selection: Selection {
            platform: Arc::new(StaticPlatform::new(["posix"])),
            ..Selection::default()
        },
        timeout: Duration::from_secs(10),
        ..TestRunnerConfig::default()
    })
}

fn statuses(summary: &TestSummary) -> Vec<(&str, Status)> {
    summary
        .results
        .iter()
        .map(|r| (r.name.as_str(), r.status()))
        .collect()
}

#[test]
fn test_prefix_discovery_scenario() {
    let ns = crate::namespace!("scenario" => [test_a, test_b, helper_c]);
    assert_eq!(ns.entry_names().count(), 3);

    let suite = discover(&ns);
    assert_eq!(suite.names().collect::<Vec<_>>(), vec!["test_a", "test_b"]);

    let summary = quick().run(&suite, &RecordingReporter::new());
    assert_eq!(
        statuses(&summary),
        vec![("test_a", Status::Pass), ("test_b", Status::Fail)]
    );
    assert!(!HELPER_CALLED.load(Ordering::SeqCst));
    assert_eq!(summary.exit_code(), 1);

    let TestOutcome::Failed(err) = &summary.results[1].outcome else {
        panic!("test_b should fail");
    };
    assert_eq!(err.kind, AssertionKind::Mismatch);
    assert_eq!(err.expected.as_deref(), Some("3"));
    assert_eq!(err.actual.as_deref(), Some("2"));
}

#[test]
fn test_one_result_per_case_and_idempotent() {
    let suite: TestSuite = [
        TestCase::new("test_pass", |_| Ok(())),
        TestCase::new("test_fail", |_| Ok(assert_true(false, "nope")?)),
        TestCase::new("test_skip", |_| Ok(())).skip_when("posix"),
        TestCase::new("test_error", |_| Err(TestError::Unexpected("boom".into()))),
    ]
    .into_iter()
    .collect();

    let runner = quick();
    let first = runner.run(&suite, &RecordingReporter::new());
    let second = runner.run(&suite, &RecordingReporter::new());

    assert_eq!(first.total(), suite.len());
    assert_eq!(statuses(&first), statuses(&second));
    assert_eq!(
        statuses(&first),
        vec![
            ("test_pass", Status::Pass),
            ("test_fail", Status::Fail),
            ("test_skip", Status::Skip),
            ("test_error", Status::Error),
        ]
    );
}

#[test]
fn test_fresh_context_per_case() {
    let suite: TestSuite = [
        TestCase::new("test_store", |ctx| {
            assert_true(ctx.get::<u32>().is_none(), "context should start empty")?;
            ctx.insert(7u32);
            Ok(())
        }),
        TestCase::new("test_load", |ctx| {
            Ok(assert_true(ctx.get::<u32>().is_none(), "state leaked between cases")?)
        }),
    ]
    .into_iter()
    .collect();
    let summary = quick().run(&suite, &RecordingReporter::new());
    assert_eq!(summary.passed, 2);
}

#[test]
fn test_timeout_does_not_stop_run() {
    let suite: TestSuite = [
        TestCase::new("test_hang", |_| {
            thread::sleep(Duration::from_secs(30));
            Ok(())
        })
        .timeout(Duration::from_millis(100)),
        TestCase::new("test_after", |_| Ok(())),
    ]
    .into_iter()
    .collect();

    let start = Instant::now();
    let summary = quick().run(&suite, &RecordingReporter::new());
    assert!(start.elapsed() < Duration::from_secs(10));

    let TestOutcome::Errored(err) = &summary.results[0].outcome else {
        panic!("hung case should error");
    };
    assert!(err.is_timeout());
    assert!(summary.results[1].outcome.is_passed());
    assert_eq!(summary.exit_code(), 1);
}

#[cfg(unix)]
#[test]
fn test_hung_subprocess_is_bounded() {
    let suite: TestSuite = [
        TestCase::new("test_sleeper", |ctx| {
            let mut command = std::process::Command::new("sleep");
            command.arg("30");
            ctx.run_command(command)?;
            Ok(())
        })
        .timeout(Duration::from_millis(300)),
        TestCase::new("test_next", |_| Ok(())),
    ]
    .into_iter()
    .collect();

    let summary = quick().run(&suite, &RecordingReporter::new());
    assert_eq!(summary.results[0].status(), Status::Error);
    assert_eq!(summary.results[0].detail()[0].split(':').next(), Some("Timeout"));
    assert_eq!(summary.results[1].status(), Status::Pass);
    assert_ne!(summary.exit_code(), 0);
}

#[test]
fn test_panic_is_errored() {
    let suite: TestSuite = [TestCase::new("test_panics", |_| {
        let v: Vec<u8> = Vec::new();
        let _ = v[3];
        Ok(())
    })]
    .into_iter()
    .collect();
    let summary = quick().run(&suite, &RecordingReporter::new());
    let TestOutcome::Errored(TestError::Panic(message)) = &summary.results[0].outcome else {
        panic!("expected a panic outcome");
    };
    assert!(message.contains("index out of bounds"));
}

#[test]
fn test_fixture_lifecycle() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&teardowns);
    let fixture = Arc::new(FnFixture::new(
        |ctx: &mut TestContext| {
            ctx.insert(String::from("prepared"));
            Ok(())
        },
        move |ctx: &mut TestContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.take::<String>();
            Ok(())
        },
    ));

    let suite: TestSuite = [
        TestCase::new("test_uses_setup", |ctx| {
            Ok(check_eq(ctx.get::<String>().map(String::as_str), Some("prepared"))?)
        })
        .fixture(fixture.clone()),
        TestCase::new("test_fails_body", |_| Ok(assert_true(false, "body")?))
            .fixture(fixture.clone()),
    ]
    .into_iter()
    .collect();

    let summary = quick().run(&suite, &RecordingReporter::new());
    assert_eq!(
        statuses(&summary),
        vec![("test_uses_setup", Status::Pass), ("test_fails_body", Status::Fail)]
    );
    assert_eq!(teardowns.load(Ordering::SeqCst), 2);
}

#[test]
fn test_setup_failure_skips_body_and_teardown() {
    let body_ran = Arc::new(AtomicBool::new(false));
    let teardown_ran = Arc::new(AtomicBool::new(false));
    let (body_flag, teardown_flag) = (Arc::clone(&body_ran), Arc::clone(&teardown_ran));

    let fixture = Arc::new(FnFixture::new(
        |_: &mut TestContext| Err(TestError::Unexpected("no database".into())),
        move |_: &mut TestContext| {
            teardown_flag.store(true, Ordering::SeqCst);
            Ok(())
        },
    ));
    let suite: TestSuite = [
        TestCase::new("test_guarded", move |_| {
            body_flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .fixture(fixture),
        TestCase::new("test_unaffected", |_| Ok(())),
    ]
    .into_iter()
    .collect();

    let summary = quick().run(&suite, &RecordingReporter::new());
    assert!(matches!(
        summary.results[0].outcome,
        TestOutcome::Errored(TestError::Setup(_))
    ));
    assert!(summary.results[1].outcome.is_passed());
    assert!(!body_ran.load(Ordering::SeqCst));
    assert!(!teardown_ran.load(Ordering::SeqCst));
}

#[test]
fn test_teardown_failure_errors_passing_case() {
    let fixture = Arc::new(FnFixture::new(
        |_: &mut TestContext| Ok(()),
        |_: &mut TestContext| Err(TestError::Unexpected("cleanup".into())),
    ));
    let suite: TestSuite = [TestCase::new("test_ok_body", |_| Ok(())).fixture(fixture)]
        .into_iter()
        .collect();
    let summary = quick().run(&suite, &RecordingReporter::new());
    let TestOutcome::Errored(err) = &summary.results[0].outcome else {
        panic!("teardown failure should error the case");
    };
    assert_eq!(err.kind(), "TeardownError");
}

#[test]
fn test_sequential_reporting_order() {
    let suite: TestSuite = [
        TestCase::new("test_one", |_| Ok(())),
        TestCase::new("test_two", |_| Ok(())),
    ]
    .into_iter()
    .collect();
    let reporter = RecordingReporter::new();
    quick().run(&suite, &reporter);
    assert_eq!(
        reporter.events(),
        vec![
            ReportEvent::RunStarted(2),
            ReportEvent::CaseStarted("test_one".into()),
            ReportEvent::CaseFinished("test_one".into(), Status::Pass),
            ReportEvent::CaseStarted("test_two".into()),
            ReportEvent::CaseFinished("test_two".into(), Status::Pass),
            ReportEvent::RunFinished {
                total: 2,
                exit_code: 0
            },
        ]
    );
}

#[test]
fn test_parallel_keeps_suite_order() {
    let suite: TestSuite = (0..16u64)
        .map(|i| {
            TestCase::new(format!("test_{i:02}"), move |_| {
                thread::sleep(Duration::from_millis(16 - i));
                if i % 5 == 0 {
                    Ok(assert_true(false, "multiple of five")?)
                } else {
                    Ok(())
                }
            })
        })
        .collect();

    let mut config = quick().config().clone();
    config.parallel = true;
    let reporter = RecordingReporter::new();
    let summary = TestRunner::with_config(config).run(&suite, &reporter);

    let expected: Vec<String> = suite.names().map(str::to_string).collect();
    assert_eq!(reporter.finished(), expected);
    assert_eq!(summary.failed, 4);
    assert_eq!(summary.passed, 12);
}

#[test]
fn test_filter_and_empty_selection() {
    let ns = Namespace::new("m")
        .with("test_dict_keys", |_| Ok(()))
        .with("test_list_append", |_| Ok(()));
    let suite = discover(&ns);

    let mut config = quick().config().clone();
    config.selection.filter = Some("dict".into());
    let runner = TestRunner::with_config(config.clone());
    assert_eq!(runner.plan_names(&suite), vec!["test_dict_keys"]);

    config.selection.filter = Some("nothing".into());
    let summary = TestRunner::with_config(config).run(&suite, &RecordingReporter::new());
    assert_eq!(summary.total(), 0);
    assert_eq!(summary.exit_code(), 2);
}

#[test]
fn test_run_case_directly() {
    let case = TestCase::new("test_direct", |ctx| {
        Ok(check_eq(ctx.name(), "test_direct")?)
    });
    let result = run_case(&case, Duration::from_secs(5));
    assert_eq!(result.status(), Status::Pass);
    assert!(result.duration < Duration::from_secs(5));
}
