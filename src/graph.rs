//! Dependency edges between workspace packages.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::cargo::CargoManifest;
use crate::workspace::Workspace;

/// An edge `package -> dependency`, keyed by package keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub package: String,
    pub dependency: String,
    /// Name under which `dependency` appears in the manifest of `package`.
    pub declared_as: String,
}

/// Sibling dependencies of every package in a workspace.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<DependencyEdge>>,
}

impl DependencyGraph {
    /// Read every manifest and record which siblings it depends on.
    ///
    /// A dependency only counts when it declares a version; path-only
    /// dependencies have nothing to keep in sync.
    pub fn discover(workspace: &Workspace) -> Result<Self> {
        let mut edges = BTreeMap::new();

        for package in workspace.packages() {
            let manifest = CargoManifest::load(&package.manifest)?;
            let mut deps = Vec::new();

            for candidate in workspace.packages() {
                if candidate.key == package.key {
                    continue;
                }

                let declared = candidate
                    .dependency_names()
                    .into_iter()
                    .find(|name| manifest.depends_on(name));

                if let Some(declared_as) = declared {
                    log::debug!("{} depends on {}", package.key, candidate.key);
                    deps.push(DependencyEdge {
                        package: package.key.clone(),
                        dependency: candidate.key.clone(),
                        declared_as: declared_as.to_string(),
                    });
                }
            }

            edges.insert(package.key.clone(), deps);
        }

        Ok(Self { edges })
    }

    /// Sibling dependencies of `package`.
    pub fn dependencies_of(&self, package: &str) -> &[DependencyEdge] {
        self.edges.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges, grouped by depending package in key order.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.values().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}
