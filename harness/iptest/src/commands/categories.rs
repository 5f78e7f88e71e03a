//! The `categories` command: show the manifest, or which categories hold a test.

use std::io::Write;
use std::path::Path;

use ipt_manifest::CategoryManifest;

use super::{load_config, CommandError};

/// Without `test`, list every category and its size. With `test`, list the
/// categories containing it; exits 1 when there are none.
pub fn list_categories<W: Write>(
    test: Option<&str>,
    config_path: Option<&Path>,
    mut out: W,
) -> Result<i32, CommandError> {
    let config = load_config(config_path)?;
    let manifest = CategoryManifest::load_or_empty(&config.manifest_path())?;

    let Some(test) = test else {
        if manifest.is_empty() {
            writeln!(out, "No categories defined.")?;
        }
        for (name, modules) in manifest.categories() {
            writeln!(out, "{name} ({} tests)", modules.len())?;
        }
        return Ok(0);
    };

    let found = manifest.categories_of(test);
    if found.is_empty() {
        writeln!(out, "{test} is not in any category")?;
        return Ok(1);
    }
    for name in found {
        writeln!(out, "{name}")?;
    }
    Ok(0)
}
