//! Per-fragment output logs.
//!
//! For a fragment named `n` the directory holds:
//!
//! - `ref_n.log`: normalized reference output
//! - `cand_n.log`: normalized candidate output
//! - `dif_n.log`: unified diff, present only while the outputs differ
//!
//! A stored `ref_n.log` can stand in for the reference runtime on hosts
//! where it is not installed (see [`Comparator::against_baseline`]).
//!
//! [`Comparator::against_baseline`]: crate::Comparator::against_baseline

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compare::{ComparisonRecord, Verdict};
use crate::error::SbsError;

/// A directory of reference, candidate, and diff logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogDir {
    root: PathBuf,
}

impl LogDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LogDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reference_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("ref_{name}.log"))
    }

    pub fn candidate_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("cand_{name}.log"))
    }

    pub fn diff_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("dif_{name}.log"))
    }

    /// Stored reference output for `name`.
    pub fn read_reference(&self, name: &str) -> Result<String, SbsError> {
        let path = self.reference_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SbsError::MissingBaseline { path })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write the logs for a finished comparison.
    ///
    /// Records that could not run are not written, so a failed reference
    /// never replaces a stored one.
    pub fn write(&self, record: &ComparisonRecord) -> Result<(), SbsError> {
        if record.is_error() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;
        fs::write(self.reference_path(&record.name), &record.reference)?;
        fs::write(self.candidate_path(&record.name), &record.candidate)?;

        let diff = self.diff_path(&record.name);
        match record.verdict {
            Verdict::Mismatch => fs::write(diff, record.render_diff())?,
            _ => match fs::remove_file(diff) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            },
        }
        tracing::trace!(name = %record.name, dir = %self.root.display(), "wrote output logs");
        Ok(())
    }
}
