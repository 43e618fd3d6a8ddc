//! README version references.
//!
//! Documentation embeds dependency snippets such as
//! `alpha = { version = "0.1.0" }`; those example versions follow the
//! package version.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// `version = "..."` as a standalone key. The leading class keeps keys such as
// `rust-version` out.
static EXAMPLE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[^\w-])(version\s*=\s*")([^"\n]+)(")"#).unwrap()
});

/// Rewrite every example version in `content`.
pub fn set_example_versions(content: &str, new_version: &str) -> String {
    let replacement = format!("${{1}}${{2}}{}${{4}}", new_version.replace('$', "$$"));
    EXAMPLE_VERSION_RE
        .replace_all(content, replacement.as_str())
        .into_owned()
}

/// A documentation file whose example versions can be rewritten.
#[derive(Debug)]
pub struct ReadmeFile {
    pub path: PathBuf,
    content: String,
    original: String,
}

impl ReadmeFile {
    /// Load the file, or `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            log::debug!("No documentation at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            original: content.clone(),
            content,
        }))
    }

    /// Returns `true` when any example version changed.
    pub fn set_version(&mut self, new_version: &str) -> bool {
        let updated = set_example_versions(&self.content, new_version);
        let changed = updated != self.content;
        self.content = updated;
        changed
    }

    pub fn is_modified(&self) -> bool {
        self.content != self.original
    }

    pub fn save(&mut self) -> Result<bool> {
        if !self.is_modified() {
            return Ok(false);
        }
        std::fs::write(&self.path, &self.content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.original = self.content.clone();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const README: &str = r#"# alpha

```toml
[dependencies]
alpha = "0.1.0"
alpha = { version = "0.1.0" }
alpha = { version = "0.1.0", features = ["fuzzy"] }
```

Set `version = "0.1.0"` in your manifest. Requires rust-version = "1.70".
"#;

    #[test]
    fn test_all_snippet_shapes_rewritten_once() {
        let updated = set_example_versions(README, "0.3.0");

        assert!(updated.contains("alpha = { version = \"0.3.0\" }"));
        assert!(updated.contains("alpha = { version = \"0.3.0\", features = [\"fuzzy\"] }"));
        assert!(updated.contains("Set `version = \"0.3.0\"` in your manifest"));
        assert!(updated.contains("rust-version = \"1.70\""));
        // Bare `alpha = "..."` carries no version key.
        assert!(updated.contains("alpha = \"0.1.0\""));
    }

    #[test]
    fn test_version_at_start_of_text() {
        assert_eq!(
            set_example_versions("version = \"1.0\"\n", "2.0"),
            "version = \"2.0\"\n"
        );
    }

    #[test]
    fn test_no_patterns_left_identical() {
        let text = "# Title\n\nNothing versioned here.\n";
        assert_eq!(set_example_versions(text, "9.9.9"), text);
    }

    #[test]
    fn test_missing_readme_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ReadmeFile::load(temp_dir.path().join("README.md"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_readme_save_only_when_changed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("README.md");
        fs::write(&path, README).unwrap();

        let mut readme = ReadmeFile::load(&path).unwrap().unwrap();
        assert!(readme.set_version("0.2.0"));
        assert!(readme.save().unwrap());

        let mut again = ReadmeFile::load(&path).unwrap().unwrap();
        assert!(!again.set_version("0.2.0"));
        assert!(!again.save().unwrap());
    }
}
