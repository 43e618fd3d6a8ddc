//! Workspace layout configuration.
//!
//! Defaults can be overridden from a `[workspace.metadata.versioner]` (or
//! `[package.metadata.versioner]`) table in the root `Cargo.toml`, and the
//! command line overrides both.

use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{DocumentMut, Item};

/// File name of every package manifest.
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Default directory holding the sub-packages.
pub const DEFAULT_CRATES_DIR: &str = "crates";

/// Default documentation file name.
pub const DEFAULT_README: &str = "README.md";

/// Layout settings used by discovery and the command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionerConfig {
    /// Directory, relative to the workspace root, containing sub-packages.
    pub crates_dir: String,
    /// Prefix stripped from generated sub-package flag names.
    pub strip_prefix: Option<String>,
    /// Documentation file looked up next to each manifest.
    pub readme: String,
}

impl Default for VersionerConfig {
    fn default() -> Self {
        Self {
            crates_dir: DEFAULT_CRATES_DIR.to_string(),
            strip_prefix: None,
            readme: DEFAULT_README.to_string(),
        }
    }
}

impl VersionerConfig {
    /// Load configuration from the root manifest of `workspace_root`.
    ///
    /// A missing manifest yields the defaults. A manifest that fails to parse
    /// is logged and also yields the defaults, since the text-level writers
    /// can still operate on it.
    pub fn load(workspace_root: impl AsRef<Path>) -> Result<Self> {
        let path = workspace_root.as_ref().join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match content.parse::<DocumentMut>() {
            Ok(document) => Ok(Self::from_document(&document)),
            Err(e) => {
                log::warn!(
                    "Ignoring versioner settings, {} is not valid TOML: {}",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    fn from_document(document: &DocumentMut) -> Self {
        let mut config = Self::default();

        let table = ["workspace", "package"].iter().find_map(|section| {
            document
                .get(section)
                .and_then(|s| s.get("metadata"))
                .and_then(|m| m.get("versioner"))
        });

        let Some(table) = table else {
            return config;
        };

        if let Some(dir) = string_setting(table, "crates-dir") {
            config.crates_dir = dir;
        }
        if let Some(prefix) = string_setting(table, "strip-prefix") {
            config.strip_prefix = Some(prefix);
        }
        if let Some(readme) = string_setting(table, "readme") {
            config.readme = readme;
        }

        config
    }

    /// Apply command-line overrides on top of the loaded settings.
    pub fn with_overrides(mut self, crates_dir: Option<String>, strip_prefix: Option<String>) -> Self {
        if let Some(dir) = crates_dir {
            self.crates_dir = dir;
        }
        if let Some(prefix) = strip_prefix {
            self.strip_prefix = Some(prefix);
        }
        self
    }
}

fn string_setting(table: &Item, key: &str) -> Option<String> {
    let item = table.get(key)?;
    match item.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            log::warn!("versioner setting '{}' must be a string, ignoring it", key);
            None
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
