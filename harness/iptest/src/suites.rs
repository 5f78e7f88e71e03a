//! File-backed test modules.
//!
//! Two conventions, both one case per file:
//! - `test_*.<ext>` scripts run under the candidate runtime and pass when
//!   they exit with status 0.
//! - `sbs_*.<ext>` fragments run under both runtimes and pass when their
//!   normalized output matches.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ipt_assert::{AssertionError, AssertionKind, RaisedError};
use ipt_sbs::{Comparator, Execution, ProcessRunner, Verdict};

use crate::test::{TestCase, TestError, TestModule, TestSuite};

/// Prefix of script test files.
pub const SCRIPT_PREFIX: &str = "test_";
/// Prefix of side-by-side fragment files.
pub const SBS_PREFIX: &str = "sbs_";

/// Find files named `<prefix>*.<extension>` under `root`, sorted by path.
///
/// `root` may also be a single file.
pub fn discover_files(root: &Path, prefix: &str, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if root.is_file() {
        if matches_convention(root, prefix, extension) {
            files.push(root.to_path_buf());
        }
    } else {
        discover_recursive(root, prefix, extension, &mut files);
        files.sort();
    }
    files
}

fn discover_recursive(dir: &Path, prefix: &str, extension: &str, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // Skip hidden files and directories
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            if matches!(name, "target" | "node_modules" | "__pycache__") {
                continue;
            }
            discover_recursive(&path, prefix, extension, files);
        } else if matches_convention(&path, prefix, extension) {
            files.push(path);
        }
    }
}

fn matches_convention(path: &Path, prefix: &str, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix))
}

/// Module name of a test file: its stem (`test_bool.py` → `test_bool`).
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A module whose single case runs `path` under `runner`.
pub fn script_module(path: &Path, runner: Arc<ProcessRunner>) -> TestModule {
    let name = module_name(path);
    let script = path.to_path_buf();
    let case = TestCase::new(name.clone(), move |ctx| {
        let execution = runner.run_file_with_timeout(&script, ctx.timeout())?;
        if execution.success() {
            Ok(())
        } else {
            Err(script_failure(&execution))
        }
    });
    TestModule::new(name, TestSuite::from_iter([case]))
}

/// Turn a failed script run into the error it raised.
///
/// An uncaught `AssertionError` is an assertion failure; any other
/// traceback is an unexpected error. Without a recognizable traceback the
/// exit status and stderr tail are reported.
pub fn script_failure(execution: &Execution) -> TestError {
    match RaisedError::from_traceback(&execution.stderr) {
        Some(raised) if is_assertion_kind(&raised.kind) => AssertionError {
            kind: AssertionKind::Failed,
            expected: None,
            actual: None,
            message: if raised.message.is_empty() {
                raised.kind
            } else {
                raised.message
            },
            location: None,
        }
        .into(),
        Some(raised) => raised.into(),
        None => {
            let status = execution
                .status
                .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
            let tail: Vec<&str> = execution.stderr.lines().rev().take(5).collect();
            let mut message = format!("script exited with {status}");
            for line in tail.into_iter().rev() {
                message.push('\n');
                message.push_str(line);
            }
            TestError::Unexpected(message)
        }
    }
}

fn is_assertion_kind(kind: &str) -> bool {
    kind.rsplit('.').next() == Some("AssertionError")
}

/// A module whose single case compares `path` across both runtimes.
pub fn sbs_module(path: &Path, comparator: Arc<Comparator>) -> TestModule {
    let name = module_name(path);
    let fragment = path.to_path_buf();
    let case_name = name.clone();
    let case = TestCase::new(name.clone(), move |_ctx| {
        let code = fs::read_to_string(&fragment)?;
        let record = comparator.compare(&case_name, &code);
        match &record.verdict {
            Verdict::Match => Ok(()),
            Verdict::Mismatch => {
                let line = record.diff.first_changed_line().unwrap_or(0);
                Err(AssertionError {
                    kind: AssertionKind::Mismatch,
                    expected: None,
                    actual: None,
                    message: format!(
                        "{} output differs from {} at line {line}\n{}",
                        record.candidate_runtime,
                        record.reference_runtime,
                        record.render_diff().trim_end()
                    ),
                    location: None,
                }
                .into())
            }
            Verdict::Error(message) => match record.timeout() {
                Some(limit) => Err(TestError::Timeout(limit)),
                None => Err(TestError::Unexpected(message.clone())),
            },
        }
    });
    TestModule::new(name, TestSuite::from_iter([case]))
}

/// Script modules for every `test_*` file under `dir`.
pub fn script_modules(
    dir: &Path,
    runner: &Arc<ProcessRunner>,
    extension: &str,
) -> Vec<TestModule> {
    discover_files(dir, SCRIPT_PREFIX, extension)
        .iter()
        .map(|path| script_module(path, Arc::clone(runner)))
        .collect()
}

/// SBS modules for every `sbs_*` file under `dir`.
pub fn sbs_modules(
    dir: &Path,
    comparator: &Arc<Comparator>,
    extension: &str,
) -> Vec<TestModule> {
    discover_files(dir, SBS_PREFIX, extension)
        .iter()
        .map(|path| sbs_module(path, Arc::clone(comparator)))
        .collect()
}
