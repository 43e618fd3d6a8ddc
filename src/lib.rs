//! Version synchronization for multi-package Cargo workspaces.
//!
//! This crate discovers the root package and the sub-packages under
//! `crates/`, then keeps their own versions, the versions they record for
//! each other, and the example versions in their READMEs in step.

pub mod cargo;
pub mod cli;
pub mod config;
pub mod graph;
pub mod readme;
pub mod version;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use cargo::CargoManifest;
pub use config::VersionerConfig;
pub use graph::{DependencyEdge, DependencyGraph};
pub use readme::ReadmeFile;
pub use version::{ChangeKind, UpdateReport, VersionChange, VersionManager, VersionReport};
pub use workspace::{Package, Workspace, WorkspaceScanner, MAIN_PACKAGE};
