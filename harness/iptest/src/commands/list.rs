//! The `list` command: print the cases a selector names, without running them.

use std::io::Write;
use std::path::Path;

use ipt_manifest::CategoryManifest;

use super::{load_config, CommandError};
use crate::registry::{Registry, ALL};
use crate::test::TestSuite;

pub fn list_tests<W: Write>(
    selector: Option<&str>,
    config_path: Option<&Path>,
    mut out: W,
) -> Result<i32, CommandError> {
    let config = load_config(config_path)?;
    let registry = Registry::from_config(&config)?;
    let manifest = CategoryManifest::load_or_empty(&config.manifest_path())?;

    let suite = TestSuite::from_modules(registry.select(selector.unwrap_or(ALL), &manifest)?);
    for name in suite.names() {
        writeln!(out, "{name}")?;
    }
    writeln!(out)?;
    writeln!(out, "{} tests", suite.len())?;
    Ok(0)
}
