//! All known test modules, and selector resolution over them.

use std::collections::BTreeSet;
use std::sync::Arc;

use ipt_manifest::{CategoryManifest, Resolved};
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::config::Config;
use crate::suites::{sbs_modules, script_modules};
use crate::test::TestModule;

/// Selector naming every module.
pub const ALL: &str = "all";

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("`{0}` is neither a category nor a known test module")]
    Unknown(String),
}

/// Test modules in registration order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    modules: Vec<TestModule>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Script and SBS modules for the runtimes `config` defines.
    ///
    /// Script modules need a candidate runtime; SBS modules also need a
    /// reference runtime or stored reference logs. A suite whose runtimes
    /// are missing contributes nothing.
    pub fn from_config(config: &Config) -> Result<Self, crate::config::ConfigError> {
        let mut registry = Registry::new();
        let candidate = config.candidate_runner().ok().map(Arc::new);
        let extension = config
            .runtimes
            .candidate
            .as_ref()
            .map_or("py", |rt| rt.extension.as_str());

        match &candidate {
            Some(runner) => {
                registry.extend(script_modules(&config.scripts_dir(), runner, extension));
            }
            None => tracing::warn!("no candidate runtime configured, script tests unavailable"),
        }

        if config.has_comparison() {
            let comparator = Arc::new(config.comparator()?);
            registry.extend(sbs_modules(&config.sbs_dir(), &comparator, extension));
        }

        tracing::debug!(modules = registry.len(), "registry loaded");
        Ok(registry)
    }

    pub fn add(&mut self, module: TestModule) {
        self.modules.push(module);
    }

    pub fn extend<I: IntoIterator<Item = TestModule>>(&mut self, modules: I) {
        self.modules.extend(modules);
    }

    pub fn modules(&self) -> &[TestModule] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<&TestModule> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules named by `selector`: `all`, a category, or a module name.
    ///
    /// Category members are returned in registry order; members with no
    /// registered module are logged and ignored.
    pub fn select(
        &self,
        selector: &str,
        manifest: &CategoryManifest,
    ) -> Result<Vec<&TestModule>, SelectError> {
        if selector == ALL {
            return Ok(self.modules.iter().collect());
        }
        match manifest.resolve(selector) {
            Resolved::Category { name, modules } => {
                let known: FxHashSet<&str> = self.modules.iter().map(TestModule::name).collect();
                let missing: BTreeSet<&str> = modules
                    .iter()
                    .map(String::as_str)
                    .filter(|m| !known.contains(m))
                    .collect();
                if !missing.is_empty() {
                    tracing::warn!(category = name, ?missing, "category lists unknown modules");
                }
                Ok(self
                    .modules
                    .iter()
                    .filter(|m| modules.contains(m.name()))
                    .collect())
            }
            Resolved::Module(name) => self
                .get(name)
                .map(|m| vec![m])
                .ok_or_else(|| SelectError::Unknown(name.to_string())),
        }
    }
}
