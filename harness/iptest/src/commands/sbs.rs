//! The `sbs` command: compare individual fragment files between the reference
//! (a runtime or stored logs) and the candidate.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use super::{load_config, runner_config, CommandError, RunOptions};
use crate::suites::sbs_module;
use crate::test::{ConsoleReporter, TestRunner, TestSuite};

/// Compare each of `files`, which need not follow the `sbs_` naming
/// convention. `options` supplies the config path and runner overrides.
pub fn compare_files<W: Write + Send>(
    files: &[PathBuf],
    options: &RunOptions,
    out: W,
) -> Result<i32, CommandError> {
    if files.is_empty() {
        return Err(CommandError::Usage("no files to compare".to_string()));
    }
    if let Some(missing) = files.iter().find(|f| !f.is_file()) {
        return Err(CommandError::Usage(format!(
            "file not found: {}",
            missing.display()
        )));
    }

    let config = load_config(options.config.as_deref())?;
    let comparator = Arc::new(config.comparator()?);
    let modules: Vec<_> = files
        .iter()
        .map(|file| sbs_module(file, Arc::clone(&comparator)))
        .collect();

    let runner = TestRunner::with_config(runner_config(options, &config)?);
    let reporter = ConsoleReporter::new(out, options.verbose);
    let summary = runner.run(&TestSuite::from_modules(&modules), &reporter);
    Ok(summary.exit_code())
}
