//! Reference vs candidate comparison.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::diff::{line_diff, LineDiff};
use crate::error::SbsError;
use crate::logs::LogDir;
use crate::normalize::Normalizer;
use crate::runner::{Execution, ExternalRunner};

/// What besides stdout takes part in the comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Append normalized stderr after a `[stderr]` marker.
    pub compare_stderr: bool,
    /// Append an `[exit status: N]` line.
    pub compare_status: bool,
}

/// Outcome of one comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Normalized outputs are identical.
    Match,
    /// Normalized outputs differ; see [`ComparisonRecord::diff`].
    Mismatch,
    /// A runtime could not execute the fragment.
    Error(String),
}

/// Both captured outputs, their diff, and the verdict.
#[derive(Clone, Debug)]
pub struct ComparisonRecord {
    pub name: String,
    pub reference_runtime: String,
    pub candidate_runtime: String,
    /// Normalized reference output (empty when the reference failed).
    pub reference: String,
    /// Normalized candidate output (empty when the candidate failed).
    pub candidate: String,
    pub diff: LineDiff,
    pub verdict: Verdict,
    /// The backend errors behind a [`Verdict::Error`].
    pub failures: Vec<Arc<SbsError>>,
}

impl ComparisonRecord {
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }

    pub fn is_mismatch(&self) -> bool {
        self.verdict == Verdict::Mismatch
    }

    pub fn is_error(&self) -> bool {
        matches!(self.verdict, Verdict::Error(_))
    }

    /// The exceeded limit, when a runtime was killed for running too long.
    pub fn timeout(&self) -> Option<Duration> {
        self.failures.iter().find_map(|err| err.timeout())
    }

    /// Unified diff labelled with the runtime names.
    pub fn render_diff(&self) -> String {
        self.diff
            .render_unified(&self.reference_runtime, &self.candidate_runtime)
    }
}

/// Records from [`Comparator::compare_batch`], in input order.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub records: Vec<ComparisonRecord>,
}

impl BatchReport {
    pub fn mismatches(&self) -> impl Iterator<Item = &ComparisonRecord> {
        self.records.iter().filter(|r| r.is_mismatch())
    }

    pub fn errors(&self) -> impl Iterator<Item = &ComparisonRecord> {
        self.records.iter().filter(|r| r.is_error())
    }

    pub fn all_match(&self) -> bool {
        self.records.iter().all(ComparisonRecord::is_match)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Runtime name reported for stored reference output.
const BASELINE_NAME: &str = "baseline";

/// Where reference output comes from.
#[derive(Clone)]
enum Reference {
    Runtime(Arc<dyn ExternalRunner>),
    Stored(LogDir),
}

/// Runs fragments under two runtimes and diffs their normalized output.
#[derive(Clone)]
pub struct Comparator {
    reference: Reference,
    candidate: Arc<dyn ExternalRunner>,
    normalizer: Normalizer,
    options: CompareOptions,
    logs: Option<LogDir>,
}

impl Comparator {
    pub fn new(reference: Arc<dyn ExternalRunner>, candidate: Arc<dyn ExternalRunner>) -> Self {
        Comparator::with_reference(Reference::Runtime(reference), candidate)
    }

    /// Compare the candidate against reference logs stored in `baseline`
    /// instead of running a reference runtime.
    pub fn against_baseline(baseline: LogDir, candidate: Arc<dyn ExternalRunner>) -> Self {
        Comparator::with_reference(Reference::Stored(baseline), candidate)
    }

    fn with_reference(reference: Reference, candidate: Arc<dyn ExternalRunner>) -> Self {
        Comparator {
            reference,
            candidate,
            normalizer: Normalizer::new(),
            options: CompareOptions::default(),
            logs: None,
        }
    }

    /// Write reference, candidate, and diff logs for every comparison.
    #[must_use]
    pub fn with_log_dir(mut self, logs: LogDir) -> Self {
        self.logs = Some(logs);
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn options(&self) -> CompareOptions {
        self.options
    }

    pub fn log_dir(&self) -> Option<&LogDir> {
        self.logs.as_ref()
    }

    pub fn reference_name(&self) -> &str {
        match &self.reference {
            Reference::Runtime(runner) => runner.name(),
            Reference::Stored(_) => BASELINE_NAME,
        }
    }

    /// Compare one fragment. Backend failures become [`Verdict::Error`].
    #[tracing::instrument(level = "debug", skip(self, code))]
    pub fn compare(&self, name: &str, code: &str) -> ComparisonRecord {
        let reference = match &self.reference {
            Reference::Runtime(runner) => runner.execute(code).map(|run| self.capture(&run)),
            Reference::Stored(baseline) => baseline.read_reference(name),
        };
        let candidate = self.candidate.execute(code).map(|run| self.capture(&run));

        let mut record = ComparisonRecord {
            name: name.to_string(),
            reference_runtime: self.reference_name().to_string(),
            candidate_runtime: self.candidate.name().to_string(),
            reference: String::new(),
            candidate: String::new(),
            diff: LineDiff::default(),
            verdict: Verdict::Match,
            failures: Vec::new(),
        };

        let mut problems = Vec::new();
        for (runtime, result, slot) in [
            (self.reference_name(), reference, &mut record.reference),
            (self.candidate.name(), candidate, &mut record.candidate),
        ] {
            match result {
                Ok(output) => *slot = output,
                Err(err) => {
                    problems.push(backend_problem(runtime, &err));
                    record.failures.push(Arc::new(err));
                }
            }
        }

        if problems.is_empty() {
            record.diff = line_diff(&record.reference, &record.candidate);
            if !record.diff.is_empty() {
                tracing::debug!(
                    %name,
                    first_changed_line = record.diff.first_changed_line(),
                    "outputs differ"
                );
                record.verdict = Verdict::Mismatch;
            }
        } else {
            let message = problems.join("; ");
            tracing::warn!(%name, %message, "comparison could not run");
            record.verdict = Verdict::Error(message);
        }

        if let Some(logs) = &self.logs {
            if let Err(err) = logs.write(&record) {
                tracing::warn!(%name, error = %err, "failed to write output logs");
            }
        }
        record
    }

    /// Compare every `(name, code)` fragment, in order.
    ///
    /// Mismatches and backend errors are recorded, never returned as `Err`.
    pub fn compare_batch<'a, I>(&self, fragments: I) -> BatchReport
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let records = fragments
            .into_iter()
            .map(|(name, code)| self.compare(name, code))
            .collect();
        BatchReport { records }
    }

    fn capture(&self, execution: &Execution) -> String {
        let mut out = self.normalizer.normalize(&execution.stdout);
        if self.options.compare_stderr {
            let stderr = self.normalizer.normalize(&execution.stderr);
            if !stderr.is_empty() {
                out.push_str("[stderr]\n");
                out.push_str(&stderr);
            }
        }
        if self.options.compare_status {
            let _ = match execution.status {
                Some(code) => writeln!(out, "[exit status: {code}]"),
                None => writeln!(out, "[exit status: signal]"),
            };
        }
        out
    }
}

fn backend_problem(runtime: &str, err: &SbsError) -> String {
    format!("{runtime}: {err}")
}
