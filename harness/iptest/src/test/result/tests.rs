use super::*;
use ipt_assert::{AssertionKind, RaisedError};
use pretty_assertions::assert_eq;

fn mismatch() -> AssertionError {
    AssertionError::new(AssertionKind::Mismatch, "expected 4, got 3")
        .with_expected("4")
        .with_actual("3")
}

#[test]
fn test_outcome_predicates() {
    assert!(TestOutcome::Passed.is_passed());
    assert!(!TestOutcome::Passed.is_failed());
    assert!(TestOutcome::Failed(mismatch()).is_failed());
    assert!(TestOutcome::Skipped("reason".into()).is_skipped());
    assert!(TestOutcome::Errored(TestError::Unexpected("boom".into())).is_errored());
    assert_eq!(TestOutcome::Skipped(String::new()).status(), Status::Skip);
}

#[test]
fn test_from_case_classification() {
    let d = Duration::from_millis(1);
    assert_eq!(TestResult::from_case("a", Ok(()), d).status(), Status::Pass);
    assert_eq!(
        TestResult::from_case("b", Err(mismatch().into()), d).status(),
        Status::Fail
    );
    let raised = RaisedError::new("TypeError", "unsupported operand");
    assert_eq!(
        TestResult::from_case("c", Err(raised.into()), d).status(),
        Status::Error
    );
    assert_eq!(
        TestResult::from_case("d", Err(TestError::Timeout(d)), d).status(),
        Status::Error
    );
}

#[test]
fn test_failed_detail() {
    let result = TestResult::failed("t", mismatch(), Duration::ZERO);
    let detail = result.detail();
    assert_eq!(detail[0], "AssertionMismatch: expected 4, got 3");
    assert_eq!(detail[1], "expected: 4");
    assert_eq!(detail[2], "actual:   3");
    assert!(detail[3].starts_with("at "));
    assert!(detail[3].contains("tests.rs"));
}

#[test]
fn test_errored_detail() {
    let err = TestError::Setup(Box::new(TestError::Unexpected("db down".into())));
    let result = TestResult::errored("t", err, Duration::ZERO);
    assert_eq!(
        result.detail(),
        vec!["setup failed: UnexpectedError: db down".to_string()]
    );
}

#[test]
fn test_summary_counts() {
    let mut summary = TestSummary::new();
    summary.add_result(TestResult::passed("a", Duration::from_millis(10)));
    summary.add_result(TestResult::failed("b", mismatch(), Duration::from_millis(5)));
    summary.add_result(TestResult::skipped("c", "win32 only"));
    summary.add_result(TestResult::errored(
        "d",
        TestError::Panic("index out of bounds".into()),
        Duration::ZERO,
    ));

    assert_eq!(
        (summary.passed, summary.failed, summary.skipped, summary.errored),
        (1, 1, 1, 1)
    );
    assert_eq!(summary.total(), 4);
    assert!(summary.has_failures());
    let failing: Vec<&str> = summary.failures().map(|r| r.name.as_str()).collect();
    assert_eq!(failing, vec!["b", "d"]);
    assert_eq!(
        summary.summary_line(),
        "Ran 4 tests: 1 passed, 2 failed, 1 skipped"
    );
    assert!(summary.get("c").is_some_and(|r| r.outcome.is_skipped()));
}

#[test]
fn test_summary_exit_code() {
    let mut summary = TestSummary::new();
    assert_eq!(summary.exit_code(), 2); // No tests

    summary.add_result(TestResult::skipped("s", "known issue: x"));
    assert_eq!(summary.exit_code(), 0); // Skips are not failures

    summary.add_result(TestResult::passed("p", Duration::ZERO));
    assert_eq!(summary.exit_code(), 0);

    summary.add_result(TestResult::errored(
        "e",
        TestError::Timeout(Duration::from_secs(1)),
        Duration::ZERO,
    ));
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_status_words() {
    let words: Vec<&str> = [Status::Pass, Status::Fail, Status::Skip, Status::Error]
        .into_iter()
        .map(Status::as_str)
        .collect();
    assert_eq!(words, vec!["PASS", "FAIL", "SKIP", "ERROR"]);
}
