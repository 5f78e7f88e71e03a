//! Harness configuration (`iptest.toml`).
//!
//! ```toml
//! [runner]
//! timeout_secs = 60
//! parallel = false
//! scripts_dir = "tests"
//! sbs_dir = "tests/compat"
//! manifest = "categories.toml"
//!
//! [runtimes.reference]
//! program = "python2.7"
//!
//! [runtimes.candidate]
//! program = "ipy"
//! args = ["-X:ExceptionDetail"]
//!
//! [normalize]
//! rules = [{ pattern = 'File ".*", line \d+', replacement = "File <f>" }]
//!
//! [sbs]
//! compare_stderr = false
//! log_dir = "logs"
//!
//! [platform]
//! tags = ["cli"]
//!
//! [known_issues]
//! gh1234 = true
//! ```
//!
//! Relative paths are resolved against the directory holding the file. A
//! missing file yields the defaults. Timeouts must be positive.
//!
//! With `[sbs] log_dir` set, every comparison writes its outputs there, and
//! when no reference runtime is configured the stored reference logs are
//! compared against instead.

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ipt_sbs::{
    Comparator, CompareOptions, InputMode, LogDir, NormalizationRule, Normalizer, ProcessRunner,
    SbsError,
};
use serde::Deserialize;
use thiserror::Error;

use crate::test::{KnownIssues, StaticPlatform};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "iptest.toml";

/// Errors from loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no [runtimes.{0}] section configured")]
    MissingRuntime(&'static str),
    #[error(transparent)]
    InvalidRule(#[from] SbsError),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSection {
    pub timeout_secs: NonZeroU64,
    pub parallel: bool,
    pub scripts_dir: PathBuf,
    pub sbs_dir: PathBuf,
    pub manifest: PathBuf,
}

impl Default for RunnerSection {
    fn default() -> Self {
        RunnerSection {
            timeout_secs: NonZeroU64::new(60).unwrap_or(NonZeroU64::MIN),
            parallel: false,
            scripts_dir: PathBuf::from("tests"),
            sbs_dir: PathBuf::from("tests/compat"),
            manifest: PathBuf::from("categories.toml"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    File,
    Stdin,
}

/// One interpreter.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Report label; defaults to the program's file name.
    #[serde(default)]
    pub name: Option<String>,
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Overrides `[runner] timeout_secs` for this runtime.
    #[serde(default)]
    pub timeout_secs: Option<NonZeroU64>,
    #[serde(default)]
    pub input: InputKind,
}

fn default_extension() -> String {
    "py".to_string()
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimesSection {
    pub reference: Option<RuntimeConfig>,
    pub candidate: Option<RuntimeConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeSection {
    pub builtin: bool,
    pub rules: Vec<RuleConfig>,
}

impl Default for NormalizeSection {
    fn default() -> Self {
        NormalizeSection {
            builtin: true,
            rules: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformSection {
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SbsSection {
    pub compare_stderr: bool,
    pub compare_status: bool,
    /// Where per-fragment reference, candidate, and diff logs go.
    pub log_dir: Option<PathBuf>,
}

/// Parsed `iptest.toml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runner: RunnerSection,
    pub runtimes: RuntimesSection,
    pub normalize: NormalizeSection,
    pub platform: PlatformSection,
    pub sbs: SbsSection,
    pub known_issues: BTreeMap<String, bool>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Parse config text; relative paths resolve against `root`.
    pub fn from_toml_str(content: &str, root: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, root).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration, falling back to defaults when `path` does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config {
                root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                ..Config::default()
            })
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_secs.get())
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join(&self.runner.scripts_dir)
    }

    pub fn sbs_dir(&self) -> PathBuf {
        self.root.join(&self.runner.sbs_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.runner.manifest)
    }

    pub fn reference_runner(&self) -> Result<ProcessRunner, ConfigError> {
        let runtime = self
            .runtimes
            .reference
            .as_ref()
            .ok_or(ConfigError::MissingRuntime("reference"))?;
        Ok(self.process_runner(runtime))
    }

    pub fn candidate_runner(&self) -> Result<ProcessRunner, ConfigError> {
        let runtime = self
            .runtimes
            .candidate
            .as_ref()
            .ok_or(ConfigError::MissingRuntime("candidate"))?;
        Ok(self.process_runner(runtime))
    }

    fn process_runner(&self, runtime: &RuntimeConfig) -> ProcessRunner {
        let name = match (&runtime.name, runtime.program.file_name()) {
            (Some(name), _) => name.clone(),
            (None, Some(file)) => file.to_string_lossy().into_owned(),
            (None, None) => runtime.program.display().to_string(),
        };
        let timeout = runtime
            .timeout_secs
            .map_or_else(|| self.timeout(), |secs| Duration::from_secs(secs.get()));
        // Bare names are looked up on PATH; paths are relative to the config.
        let program = if runtime.program.is_relative() && runtime.program.components().count() > 1
        {
            self.root.join(&runtime.program)
        } else {
            runtime.program.clone()
        };
        ProcessRunner::new(name, program)
            .args(runtime.args.iter().cloned())
            .extension(runtime.extension.as_str())
            .input(match runtime.input {
                InputKind::File => InputMode::File,
                InputKind::Stdin => InputMode::Stdin,
            })
            .timeout(timeout)
    }

    pub fn normalizer(&self) -> Result<Normalizer, ConfigError> {
        let mut normalizer = if self.normalize.builtin {
            Normalizer::new()
        } else {
            Normalizer::without_builtins()
        };
        for rule in &self.normalize.rules {
            normalizer.add_rule(NormalizationRule::new(&rule.pattern, rule.replacement.as_str())?);
        }
        Ok(normalizer)
    }

    pub fn log_dir(&self) -> Option<LogDir> {
        self.sbs.log_dir.as_ref().map(|dir| LogDir::new(self.root.join(dir)))
    }

    /// Whether side-by-side modules can run: a candidate plus either a
    /// reference runtime or stored reference logs.
    pub fn has_comparison(&self) -> bool {
        self.runtimes.candidate.is_some()
            && (self.runtimes.reference.is_some() || self.sbs.log_dir.is_some())
    }

    /// Reference-versus-candidate comparator with the configured
    /// normalization and comparison options.
    ///
    /// Without a reference runtime the comparator reads stored reference
    /// logs from `[sbs] log_dir`.
    pub fn comparator(&self) -> Result<Comparator, ConfigError> {
        let logs = self.log_dir();
        let comparator = match (&self.runtimes.reference, &logs) {
            (None, Some(baseline)) => {
                Comparator::against_baseline(baseline.clone(), Arc::new(self.candidate_runner()?))
            }
            _ => {
                let reference = self.reference_runner()?;
                Comparator::new(Arc::new(reference), Arc::new(self.candidate_runner()?))
            }
        };
        let comparator = comparator
            .with_normalizer(self.normalizer()?)
            .with_options(self.compare_options());
        Ok(match logs {
            Some(logs) => comparator.with_log_dir(logs),
            None => comparator,
        })
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            compare_stderr: self.sbs.compare_stderr,
            compare_status: self.sbs.compare_status,
        }
    }

    /// Host capabilities plus the configured `[platform] tags`.
    pub fn platform(&self) -> StaticPlatform {
        let mut platform = StaticPlatform::host();
        for tag in &self.platform.tags {
            platform.insert(tag.as_str());
        }
        platform
    }

    pub fn known_issues(&self) -> KnownIssues {
        self.known_issues
            .iter()
            .map(|(name, active)| (name.as_str(), *active))
            .collect()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::test::Platform;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("", Path::new("/proj")).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(!config.runner.parallel);
        assert_eq!(config.scripts_dir(), PathBuf::from("/proj/tests"));
        assert_eq!(config.sbs_dir(), PathBuf::from("/proj/tests/compat"));
        assert_eq!(config.manifest_path(), PathBuf::from("/proj/categories.toml"));
        assert!(config.normalize.builtin);
        assert!(matches!(
            config.candidate_runner(),
            Err(ConfigError::MissingRuntime("candidate"))
        ));
        assert!(matches!(
            config.comparator(),
            Err(ConfigError::MissingRuntime("reference"))
        ));
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            [runner]
            timeout_secs = 5
            parallel = true

            [runtimes.reference]
            program = "/usr/bin/python2.7"

            [runtimes.candidate]
            name = "ipy"
            program = "bin/ipy.exe"
            args = ["-X:Frames"]
            timeout_secs = 9
            input = "stdin"

            [normalize]
            builtin = false
            rules = [{ pattern = 'line \d+', replacement = "line N" }]

            [platform]
            tags = ["cli", "netstandard"]

            [sbs]
            compare_status = true

            [known_issues]
            gh1234 = false
        "#;
        let config = Config::from_toml_str(text, Path::new("/proj")).unwrap();

        let reference = config.reference_runner().unwrap();
        assert_eq!(ipt_sbs::ExternalRunner::name(&reference), "python2.7");
        assert_eq!(reference.time_limit(), Duration::from_secs(5));

        let candidate = config.candidate_runner().unwrap();
        assert_eq!(ipt_sbs::ExternalRunner::name(&candidate), "ipy");
        assert_eq!(candidate.program(), Path::new("/proj/bin/ipy.exe"));
        assert_eq!(reference.program(), Path::new("/usr/bin/python2.7"));
        assert_eq!(candidate.time_limit(), Duration::from_secs(9));

        let normalizer = config.normalizer().unwrap();
        assert_eq!(normalizer.normalize("at line 12\n0xff\n"), "at line N\n0xff\n");

        assert!(config.platform().has("netstandard"));
        assert!(!config.known_issues().is_active("gh1234"));
        assert!(config.compare_options().compare_status);
        assert!(!config.compare_options().compare_stderr);
        assert!(config.comparator().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Config::from_toml_str("[runner]\ntimeout_secs = 0\n", Path::new(".")).is_err());
        let runtime = "[runtimes.candidate]\nprogram = \"ipy\"\ntimeout_secs = 0\n";
        assert!(Config::from_toml_str(runtime, Path::new(".")).is_err());
        let config = Config::from_toml_str("[runner]\ntimeout_secs = 1\n", Path::new(".")).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_log_dir_enables_stored_reference() {
        let text = "[runtimes.candidate]\nprogram = \"ipy\"\n";
        let config = Config::from_toml_str(text, Path::new("/proj")).unwrap();
        assert!(!config.has_comparison());
        assert!(config.log_dir().is_none());

        let text = format!("{text}\n[sbs]\nlog_dir = \"logs\"\n");
        let config = Config::from_toml_str(&text, Path::new("/proj")).unwrap();
        assert!(config.has_comparison());
        assert_eq!(config.log_dir(), Some(LogDir::new("/proj/logs")));

        let comparator = config.comparator().unwrap();
        assert_eq!(comparator.reference_name(), "baseline");
        assert_eq!(
            comparator.log_dir().map(LogDir::root),
            Some(Path::new("/proj/logs"))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml_str("[runner]\ntimeout = 3\n", Path::new(".")).is_err());
    }

    #[test]
    fn test_bad_rule() {
        let config =
            Config::from_toml_str("[normalize]\nrules = [{ pattern = '(' }]\n", Path::new("."))
                .unwrap();
        assert!(matches!(config.normalizer(), Err(ConfigError::InvalidRule(_))));
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.runner, RunnerSection::default());

        std::fs::write(&path, "[runner]\nscripts_dir = \"suite\"\n").unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.scripts_dir(), dir.path().join("suite"));

        std::fs::write(&path, "[runner\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
