//! Category manifests.
//!
//! A manifest groups test module identifiers under category names so a run
//! can be restricted to, say, `builtintypes` or `console`. It is pure data:
//! loaded once, immutable afterwards, and consulted only when selecting what
//! to run.
//!
//! # Format
//!
//! ```toml
//! [categories]
//! builtintypes = ["test_bool", "test_complex"]
//! console = """
//!     test_interactive
//!     test_superconsole
//! """
//! ```
//!
//! A category maps either to an array of identifiers or to a block string of
//! whitespace-separated identifiers. Category names must be lowercase.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("category name `{0}` must be non-empty lowercase")]
    InvalidCategoryName(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntries {
    List(Vec<String>),
    Block(String),
}

impl RawEntries {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            RawEntries::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            RawEntries::Block(block) => block.split_whitespace().map(str::to_string).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    categories: BTreeMap<String, RawEntries>,
}

/// What a run selector names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// A category and the modules it lists.
    Category {
        name: &'a str,
        modules: &'a BTreeSet<String>,
    },
    /// Not a category: the selector is taken as a module identifier.
    Module(&'a str),
}

/// Mapping from category name to the set of test module identifiers in it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryManifest {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryManifest {
    /// A manifest with no categories.
    pub fn empty() -> Self {
        CategoryManifest::default()
    }

    /// Build a manifest from `(category, modules)` pairs.
    ///
    /// Repeated categories are merged.
    pub fn from_entries<C, I, M>(entries: I) -> Result<Self, ManifestError>
    where
        C: Into<String>,
        M: Into<String>,
        I: IntoIterator<Item = (C, Vec<M>)>,
    {
        let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, modules) in entries {
            let name = validate_name(name.into())?;
            categories
                .entry(name)
                .or_default()
                .extend(modules.into_iter().map(Into::into));
        }
        Ok(CategoryManifest { categories })
    }

    /// Parse manifest text.
    ///
    /// Keys that name the same category once trimmed are merged.
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content)?;
        let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, entries) in raw.categories {
            categories
                .entry(validate_name(name)?)
                .or_default()
                .extend(entries.into_set());
        }
        Ok(CategoryManifest { categories })
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load a manifest file, treating a missing file as an empty manifest.
    pub fn load_or_empty(path: &Path) -> Result<Self, ManifestError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::empty())
        }
    }

    /// Modules listed under `category`.
    pub fn tests_in(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(category)
    }

    /// Categories that list `module`, in name order.
    pub fn categories_of(&self, module: &str) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, modules)| modules.contains(module))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// All categories in name order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.categories
            .iter()
            .map(|(name, modules)| (name.as_str(), modules))
    }

    pub fn is_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Interpret a selector as a category if one has that name, otherwise as
    /// a module identifier.
    pub fn resolve<'a>(&'a self, selector: &'a str) -> Resolved<'a> {
        match self.categories.get_key_value(selector) {
            Some((name, modules)) => Resolved::Category { name, modules },
            None => Resolved::Module(selector),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn validate_name(name: String) -> Result<String, ManifestError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_uppercase) {
        return Err(ManifestError::InvalidCategoryName(name));
    }
    Ok(trimmed.to_string())
}
