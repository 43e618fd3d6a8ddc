//! Workspace scanning and package discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cargo::CargoManifest;
use crate::config::{VersionerConfig, MANIFEST_FILE};

/// Key under which the root package is addressed.
pub const MAIN_PACKAGE: &str = "main";

/// A package discovered in the workspace.
#[derive(Debug, Clone)]
pub struct Package {
    /// `main` for the root package, otherwise the directory name.
    pub key: String,
    /// Crate name from the manifest, falling back to the key.
    pub name: String,
    pub dir: PathBuf,
    pub manifest: PathBuf,
    pub version: Option<String>,
}

impl Package {
    fn from_manifest(key: String, manifest: CargoManifest) -> Self {
        let dir = manifest
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = manifest
            .package_name()
            .map(str::to_string)
            .unwrap_or_else(|| key.clone());
        let version = manifest.version().map(str::to_string);

        Self {
            key,
            name,
            dir,
            manifest: manifest.path,
            version,
        }
    }

    pub fn is_main(&self) -> bool {
        self.key == MAIN_PACKAGE
    }

    /// Names under which siblings may refer to this package as a dependency.
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        if !self.is_main() && self.key != self.name {
            names.push(self.key.as_str());
        }
        names
    }

    /// Command-line flag for this package (without the leading `--`).
    ///
    /// Underscores become hyphens and `strip_prefix` is removed when it
    /// leaves something behind.
    pub fn flag_name(&self, strip_prefix: Option<&str>) -> String {
        if self.is_main() {
            return MAIN_PACKAGE.to_string();
        }
        let flag = self.key.replace('_', "-");
        match strip_prefix.and_then(|prefix| flag.strip_prefix(prefix)) {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => flag,
        }
    }
}

/// The packages of one workspace, main package first.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: VersionerConfig,
    packages: Vec<Package>,
}

impl Workspace {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &VersionerConfig {
        &self.config
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn get(&self, key: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Documentation file for a package: the root README for the main
    /// package, the package directory's README otherwise.
    pub fn readme_path(&self, package: &Package) -> PathBuf {
        if package.is_main() {
            self.root.join(&self.config.readme)
        } else {
            package.dir.join(&self.config.readme)
        }
    }
}

/// Discovers the main package and the sub-packages of a workspace.
#[derive(Debug)]
pub struct WorkspaceScanner {
    root: PathBuf,
    config: VersionerConfig,
}

impl WorkspaceScanner {
    /// Create a new workspace scanner.
    pub fn new(root: impl AsRef<Path>, config: VersionerConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    /// Scan the workspace.
    ///
    /// The root manifest becomes the `main` package. Each immediate child
    /// of the crates directory holding a manifest becomes a sub-package;
    /// directories without one are skipped.
    pub fn scan(&self) -> Result<Workspace> {
        let mut packages = Vec::new();

        let main_manifest = self.root.join(MANIFEST_FILE);
        if main_manifest.is_file() {
            let manifest = CargoManifest::load(&main_manifest)?;
            packages.push(Package::from_manifest(MAIN_PACKAGE.to_string(), manifest));
        }

        let crates_dir = self.root.join(&self.config.crates_dir);
        if crates_dir.is_dir() {
            for entry in WalkDir::new(&crates_dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(true)
                .sort_by_file_name()
            {
                let entry = entry.context("Failed to read directory entry")?;
                if !entry.file_type().is_dir() {
                    continue;
                }

                let manifest_path = entry.path().join(MANIFEST_FILE);
                if !manifest_path.is_file() {
                    log::debug!("Skipping {}: no {}", entry.path().display(), MANIFEST_FILE);
                    continue;
                }

                let key = entry.file_name().to_string_lossy().into_owned();
                if key == MAIN_PACKAGE {
                    log::warn!(
                        "Skipping {}: the name '{}' is reserved for the root package",
                        entry.path().display(),
                        MAIN_PACKAGE
                    );
                    continue;
                }

                let manifest = CargoManifest::load(&manifest_path)?;
                packages.push(Package::from_manifest(key, manifest));
            }
        }

        log::info!(
            "Discovered {} package(s) in {}",
            packages.len(),
            self.root.display()
        );

        Ok(Workspace {
            root: self.root.clone(),
            config: self.config.clone(),
            packages,
        })
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
