//! The `run` command: select modules, run their cases, stream the report.

use std::io::Write;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ipt_manifest::CategoryManifest;

use super::{load_config, CommandError};
use crate::config::Config;
use crate::registry::{Registry, ALL};
use crate::test::{ConsoleReporter, Selection, TestRunner, TestRunnerConfig, TestSuite};

/// Options of `iptest run`. Unset fields fall back to the config file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Module, category, or `all`.
    pub selector: Option<String>,
    pub filter: Option<String>,
    /// Raw `--tag=` values; a leading `-` excludes.
    pub tags: Vec<String>,
    pub config: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub parallel: Option<bool>,
    /// Raw `--known-issue=` toggles (`name=on|off`).
    pub known_issues: Vec<String>,
    pub verbose: bool,
}

/// Parse the arguments following `run`.
pub fn parse_run_options(args: &[String]) -> Result<RunOptions, CommandError> {
    let mut options = RunOptions::default();

    for arg in args {
        if let Some(filter) = arg.strip_prefix("--filter=") {
            options.filter = Some(filter.to_string());
        } else if let Some(tag) = arg.strip_prefix("--tag=") {
            options.tags.push(tag.to_string());
        } else if let Some(path) = arg.strip_prefix("--config=") {
            options.config = Some(PathBuf::from(path));
        } else if let Some(secs) = arg.strip_prefix("--timeout=") {
            let secs: NonZeroU64 = secs.parse().map_err(|_| {
                CommandError::Usage(format!(
                    "invalid --timeout value `{secs}`, expected a positive number of seconds"
                ))
            })?;
            options.timeout = Some(Duration::from_secs(secs.get()));
        } else if let Some(toggle) = arg.strip_prefix("--known-issue=") {
            options.known_issues.push(toggle.to_string());
        } else if arg == "--parallel" {
            options.parallel = Some(true);
        } else if arg == "--no-parallel" {
            options.parallel = Some(false);
        } else if arg == "--verbose" || arg == "-v" {
            options.verbose = true;
        } else if arg.starts_with('-') {
            return Err(CommandError::Usage(format!("unknown option `{arg}`")));
        } else if options.selector.is_none() {
            options.selector = Some(arg.clone());
        } else {
            return Err(CommandError::Usage(format!("unexpected argument `{arg}`")));
        }
    }

    Ok(options)
}

/// Runner configuration: config file values overridden by `options`.
pub fn runner_config(
    options: &RunOptions,
    config: &Config,
) -> Result<TestRunnerConfig, CommandError> {
    let mut selection = Selection {
        filter: options.filter.clone(),
        platform: Arc::new(config.platform()),
        known_issues: config.known_issues(),
        ..Selection::default()
    };
    for tag in &options.tags {
        selection.add_tag_arg(tag);
    }
    for toggle in &options.known_issues {
        selection
            .known_issues
            .apply_toggle(toggle)
            .map_err(CommandError::Usage)?;
    }

    Ok(TestRunnerConfig {
        selection,
        timeout: options.timeout.unwrap_or_else(|| config.timeout()),
        parallel: options.parallel.unwrap_or(config.runner.parallel),
        verbose: options.verbose,
    })
}

/// Run the selected modules, reporting to `out`.
pub fn run_tests<W: Write + Send>(options: &RunOptions, out: W) -> Result<i32, CommandError> {
    let config = load_config(options.config.as_deref())?;
    let registry = Registry::from_config(&config)?;
    let manifest = CategoryManifest::load_or_empty(&config.manifest_path())?;

    let selector = options.selector.as_deref().unwrap_or(ALL);
    let suite = TestSuite::from_modules(registry.select(selector, &manifest)?);
    let runner = TestRunner::with_config(runner_config(options, &config)?);

    let reporter = ConsoleReporter::new(out, options.verbose);
    let summary = runner.run(&suite, &reporter);
    Ok(summary.exit_code())
}
