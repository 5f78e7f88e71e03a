//! Command handlers for the `iptest` CLI.
//!
//! Handlers write their report to the given writer and return the process
//! exit code; only `main` prints errors and exits.

use std::path::{Path, PathBuf};

use ipt_manifest::ManifestError;
use thiserror::Error;

use crate::config::{Config, ConfigError, CONFIG_FILE};
use crate::registry::SelectError;

mod categories;
mod list;
mod run;
mod sbs;

pub use categories::list_categories;
pub use list::list_tests;
pub use run::{parse_run_options, run_tests, runner_config, RunOptions};
pub use sbs::compare_files;

/// Errors that abort a command before or instead of a test run.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("{0}")]
    Usage(String),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Load `path`, or `iptest.toml` in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);
    Config::load_or_default(&path)
}

/// Pull `--config=<path>` out of `args`, returning it and the rest.
pub fn split_config_arg(args: &[String]) -> (Option<PathBuf>, Vec<String>) {
    let mut config = None;
    let mut rest = Vec::new();
    for arg in args {
        match arg.strip_prefix("--config=") {
            Some(path) => config = Some(PathBuf::from(path)),
            None => rest.push(arg.clone()),
        }
    }
    (config, rest)
}
