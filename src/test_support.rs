//! Fixture workspaces shared by the unit tests.

use crate::config::VersionerConfig;
use crate::workspace::{Workspace, WorkspaceScanner};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const CORE_MANIFEST: &str = r#"[package]
name = "core"
version = "0.1.0"
edition = "2021"

[workspace]
members = ["crates/*"]

[dependencies]
serde = "1.0"
"#;

pub const ALPHA_MANIFEST: &str = r#"[package]
name = "alpha"
version = "0.1.0"
edition = "2021"

[dependencies]
core = { path = "../..", version = "0.1.0" }
"#;

pub const BETA_MANIFEST: &str = r#"[package]
name = "beta"
version = "0.2.0"
edition = "2021"

[dependencies]
"#;

pub const ALPHA_README: &str = r#"# alpha

```toml
[dependencies]
alpha = { version = "0.1.0" }
```
"#;

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

/// `core` at the root, `alpha` depending on `core`, and an independent `beta`.
pub fn create_test_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "Cargo.toml", CORE_MANIFEST);
    write(root, "crates/alpha/Cargo.toml", ALPHA_MANIFEST);
    write(root, "crates/alpha/README.md", ALPHA_README);
    write(root, "crates/beta/Cargo.toml", BETA_MANIFEST);
    fs::create_dir_all(root.join("crates/not_a_crate/src")).unwrap();

    temp
}

pub fn scan(root: &Path) -> Workspace {
    WorkspaceScanner::new(root, VersionerConfig::default())
        .scan()
        .unwrap()
}
