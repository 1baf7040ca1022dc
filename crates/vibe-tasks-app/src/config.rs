//! Client configuration loaded from TOML.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use vibe_tasks_core::{DEFAULT_CATEGORY, is_all_sentinel};

use crate::error::ValidationError;

/// Directory (below the platform config dir) holding the client configuration.
pub const CONFIG_DIR: &str = "vibe-tasks";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";

const BUILTIN_LABELS: [&str; 5] = ["日常", "购物", "学习", "工作", "其他"];

/// Top-level client configuration loaded from `vibe-tasks/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Local store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Category label set.
    #[serde(default)]
    pub categories: CategoryConfig,
}

impl ClientConfig {
    /// Load `vibe-tasks/config.toml` below `config_dir`, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_path(config_dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from an explicit file. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.categories.ensure_unique_labels()?;
        self.categories.ensure_valid_default()
    }
}

/// `[store]` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file backing the local store; in-memory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[categories]` block: the fixed category label set.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    default: Option<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            labels: BUILTIN_LABELS.iter().map(|&label| label.to_owned()).collect(),
            default: Some(DEFAULT_CATEGORY.to_owned()),
        }
    }
}

impl CategoryConfig {
    /// Configuration accepting any category (used mainly in tests).
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            labels: Vec::new(),
            default: None,
        }
    }

    /// Construct a label set with an optional default.
    #[must_use]
    pub fn from_labels<I, L>(labels: I, default: Option<&str>) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            default: default.map(str::to_owned),
        }
    }

    /// Returns true when categories are restricted to a configured set.
    #[must_use]
    pub const fn is_restricted(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Allowed labels (empty when unrestricted).
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Category preselected for new tasks.
    #[must_use]
    pub fn default_category(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Check that `candidate` belongs to the configured label set.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownCategory`] for labels outside a restricted set.
    pub fn validate_category(&self, candidate: &str) -> Result<(), ValidationError> {
        if !self.is_restricted() || self.labels.iter().any(|label| label == candidate) {
            return Ok(());
        }
        Err(ValidationError::UnknownCategory(candidate.to_owned()))
    }

    /// Human-readable list of allowed labels.
    #[must_use]
    pub fn category_hint(&self) -> Option<String> {
        if self.labels.is_empty() {
            None
        } else {
            Some(self.labels.join(", "))
        }
    }

    fn ensure_unique_labels(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for label in &self.labels {
            if label.trim().is_empty() {
                bail!("category labels must not be empty");
            }
            if is_all_sentinel(label) {
                bail!("category label '{label}' is reserved for the all-categories filter");
            }
            if !seen.insert(label.as_str()) {
                bail!("duplicate category label detected: {label}");
            }
        }
        Ok(())
    }

    fn ensure_valid_default(&self) -> Result<()> {
        let Some(default) = self.default_category() else {
            return Ok(());
        };
        if default.trim().is_empty() {
            bail!("default category must not be empty");
        }
        if self.is_restricted() && !self.labels.iter().any(|label| label == default) {
            bail!("default category '{default}' is not defined in category configuration");
        }
        Ok(())
    }
}
