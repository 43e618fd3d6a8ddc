//! Version synchronization across the workspace.

use anyhow::Result;
use colored::Colorize;
use semver::{Version, VersionReq};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cargo::CargoManifest;
use crate::graph::DependencyGraph;
use crate::readme::ReadmeFile;
use crate::workspace::{Package, Workspace};

/// What a [`VersionChange`] touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The package's own version.
    Manifest,
    /// The version recorded for a sibling dependency.
    Dependency { dependency: String },
    /// Example versions in the package documentation.
    Readme,
}

/// Represents one rewritten (or, in dry-run mode, rewritable) file.
#[derive(Debug, Clone)]
pub struct VersionChange {
    pub package: String,
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub old_version: Option<String>,
    pub new_version: String,
}

/// Changes made by a sync or update run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub dry_run: bool,
    pub changes: Vec<VersionChange>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes recorded for one package.
    pub fn changes_for<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a VersionChange> {
        self.changes.iter().filter(move |c| c.package == package)
    }

    pub fn print(&self) {
        if self.dry_run {
            println!("{}", "Dry run mode: no files were written".yellow().bold());
        }

        if self.changes.is_empty() {
            println!("{} Nothing to update", "Info:".blue().bold());
            return;
        }

        let verb = if self.dry_run { "Would update" } else { "Updated" };
        for change in &self.changes {
            let path = change.path.display().to_string();
            let transition = match &change.old_version {
                Some(old) => format!("{} → {}", old, change.new_version),
                None => change.new_version.clone(),
            };

            match &change.kind {
                ChangeKind::Manifest => println!(
                    "{} {} {} to version {}",
                    "✓".green().bold(),
                    verb,
                    path.bright_white(),
                    transition.cyan()
                ),
                ChangeKind::Dependency { dependency } => println!(
                    "{} {} dependency {} in {} to version {}",
                    "✓".green().bold(),
                    verb,
                    dependency.bright_white(),
                    path.dimmed(),
                    transition.cyan()
                ),
                ChangeKind::Readme => println!(
                    "{} {} version references in {} to {}",
                    "✓".green().bold(),
                    verb,
                    path.dimmed(),
                    transition.cyan()
                ),
            }
        }
    }
}

/// Manages version updates across the workspace.
pub struct VersionManager {
    workspace: Workspace,
    dry_run: bool,
}

impl VersionManager {
    /// Create a version manager for a scanned workspace.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            dry_run: false,
        }
    }

    /// Report changes without writing any file.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Set every package, its documentation and every sibling dependency
    /// reference to `version`.
    pub fn sync(&self, version: &str) -> Result<UpdateReport> {
        warn_if_not_semver(version);
        let mut report = self.new_report();

        for package in self.workspace.packages() {
            self.set_package_version(package, version, &mut report)?;
            self.set_readme_version(package, version, &mut report)?;
        }

        // Every package counts as updated, so every edge is rewritten.
        let graph = DependencyGraph::discover(&self.workspace)?;
        let updated: BTreeMap<String, String> = self
            .workspace
            .packages()
            .iter()
            .map(|p| (p.key.clone(), version.to_string()))
            .collect();
        self.propagate(&graph, &updated, &mut report)?;

        Ok(report)
    }

    /// Set the packages named in `requested` (package key → version) and
    /// rewrite references to them in their dependents.
    ///
    /// Packages not named are left alone, including their references to
    /// packages that did not change.
    pub fn update(&self, requested: &BTreeMap<String, String>) -> Result<UpdateReport> {
        let graph = DependencyGraph::discover(&self.workspace)?;
        let mut report = self.new_report();
        let mut updated = BTreeMap::new();

        for key in requested.keys() {
            if self.workspace.get(key).is_none() {
                log::warn!("Package '{}' not found in workspace, skipping", key);
            }
        }

        for package in self.workspace.packages() {
            let Some(version) = requested.get(&package.key) else {
                continue;
            };
            warn_if_not_semver(version);

            self.set_package_version(package, version, &mut report)?;
            self.set_readme_version(package, version, &mut report)?;
            updated.insert(package.key.clone(), version.clone());
        }

        self.propagate(&graph, &updated, &mut report)?;

        Ok(report)
    }

    fn new_report(&self) -> UpdateReport {
        UpdateReport {
            dry_run: self.dry_run,
            changes: Vec::new(),
        }
    }

    fn set_package_version(
        &self,
        package: &Package,
        version: &str,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let mut manifest = CargoManifest::load(&package.manifest)?;
        let old_version = manifest.version().map(str::to_string);

        if !manifest.set_version(version) {
            if old_version.is_none() {
                log::info!(
                    "No package version declared in {}",
                    package.manifest.display()
                );
            }
            return Ok(());
        }

        if !self.dry_run {
            manifest.save()?;
        }

        report.changes.push(VersionChange {
            package: package.key.clone(),
            path: package.manifest.clone(),
            kind: ChangeKind::Manifest,
            old_version,
            new_version: version.to_string(),
        });
        Ok(())
    }

    fn set_readme_version(
        &self,
        package: &Package,
        version: &str,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let path = self.workspace.readme_path(package);
        let Some(mut readme) = ReadmeFile::load(&path)? else {
            return Ok(());
        };

        if !readme.set_version(version) {
            return Ok(());
        }

        if !self.dry_run {
            readme.save()?;
        }

        report.changes.push(VersionChange {
            package: package.key.clone(),
            path,
            kind: ChangeKind::Readme,
            old_version: None,
            new_version: version.to_string(),
        });
        Ok(())
    }

    /// Rewrite dependency references pointing at updated packages.
    fn propagate(
        &self,
        graph: &DependencyGraph,
        updated: &BTreeMap<String, String>,
        report: &mut UpdateReport,
    ) -> Result<()> {
        for edge in graph.edges() {
            let Some(version) = updated.get(&edge.dependency) else {
                continue;
            };
            let Some(package) = self.workspace.get(&edge.package) else {
                continue;
            };

            let mut manifest = CargoManifest::load(&package.manifest)?;
            let old_version = manifest
                .dependency_version(&edge.declared_as)
                .map(str::to_string);

            if !manifest.update_dependency(&edge.declared_as, version) {
                continue;
            }

            if !self.dry_run {
                manifest.save()?;
            }

            report.changes.push(VersionChange {
                package: package.key.clone(),
                path: package.manifest.clone(),
                kind: ChangeKind::Dependency {
                    dependency: edge.declared_as.clone(),
                },
                old_version,
                new_version: version.clone(),
            });
        }

        Ok(())
    }

    /// Check for version inconsistencies across the workspace.
    pub fn check_consistency(&self) -> Result<VersionReport> {
        let graph = DependencyGraph::discover(&self.workspace)?;
        let mut report = VersionReport {
            total_packages: self.workspace.packages().len(),
            ..Default::default()
        };

        for package in self.workspace.packages() {
            match &package.version {
                Some(version) if Version::parse(version).is_err() => {
                    report.invalid_versions.push((package.key.clone(), version.clone()));
                }
                Some(_) => {}
                None => report.unversioned.push(package.key.clone()),
            }
        }

        for edge in graph.edges() {
            let (Some(package), Some(dependency)) = (
                self.workspace.get(&edge.package),
                self.workspace.get(&edge.dependency),
            ) else {
                continue;
            };
            let Some(expected) = &dependency.version else {
                continue;
            };

            let manifest = CargoManifest::load(&package.manifest)?;
            let Some(found) = manifest.dependency_version(&edge.declared_as) else {
                continue;
            };

            if found == expected.as_str() {
                continue;
            }

            report.inconsistencies.push(VersionInconsistency {
                package: package.key.clone(),
                dependency: edge.declared_as.clone(),
                expected: expected.clone(),
                found: found.to_string(),
                compatible: is_compatible(found, expected),
            });
        }

        Ok(report)
    }
}

/// Whether the requirement `found` accepts `expected`.
fn is_compatible(found: &str, expected: &str) -> bool {
    match (VersionReq::parse(found), Version::parse(expected)) {
        (Ok(req), Ok(version)) => req.matches(&version),
        _ => false,
    }
}

fn warn_if_not_semver(version: &str) {
    if let Err(e) = Version::parse(version) {
        log::warn!("'{}' is not a semver version ({}), writing it anyway", version, e);
    }
}

/// Report of version consistency check.
#[derive(Debug, Default)]
pub struct VersionReport {
    pub total_packages: usize,
    pub inconsistencies: Vec<VersionInconsistency>,
    /// Packages whose version does not parse as semver.
    pub invalid_versions: Vec<(String, String)>,
    /// Packages without a literal version (e.g. inherited from the workspace).
    pub unversioned: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VersionInconsistency {
    pub package: String,
    pub dependency: String,
    pub expected: String,
    pub found: String,
    /// The recorded requirement still accepts the current version.
    pub compatible: bool,
}

impl VersionReport {
    /// Whether any dependency reference rejects the current version.
    pub fn has_issues(&self) -> bool {
        self.inconsistencies.iter().any(|i| !i.compatible)
    }

    pub fn print(&self) {
        println!(
            "{} {} package(s) checked",
            "Info:".blue().bold(),
            self.total_packages
        );

        for (package, version) in &self.invalid_versions {
            println!(
                "{} {} has non-semver version {}",
                "⚠".yellow(),
                package.bright_white(),
                version.yellow()
            );
        }

        if !self.inconsistencies.is_empty() {
            println!("\n{}", "Dependency Inconsistencies".bright_white().bold());
            for inc in &self.inconsistencies {
                let icon = if inc.compatible { "⚠".yellow() } else { "✗".red() };
                let note = if inc.compatible { " (compatible)" } else { "" };
                println!(
                    "  {} {} → {}: found {}, expected {}{}",
                    icon,
                    inc.package.bright_white(),
                    inc.dependency,
                    inc.found.red(),
                    inc.expected.green(),
                    note.dimmed()
                );
            }
        }

        if self.has_issues() {
            println!("\n{} Run with --sync <VERSION> to realign", "Suggestion:".cyan().bold());
        } else {
            println!("{} All versions are consistent", "✓".green().bold());
        }
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
