//! Cargo.toml reading and version rewriting.
//!
//! Manifests are edited as text: only the quoted version payload is replaced,
//! every other byte of the file is preserved.

use anyhow::{Context, Result};
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PACKAGE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[[ \t]*(?:workspace\.)?package[ \t]*\][ \t]*(?:#.*)?\r?$").unwrap()
});
static TABLE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[").unwrap());
static DEPENDENCY_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*\[[ \t]*(?:workspace\.|target\.[^\]\n]+\.)?(?:dev-|build-)?dependencies[ \t]*\][ \t]*(?:#.*)?\r?$",
    )
    .unwrap()
});
static VERSION_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*version[ \t]*=[ \t]*"([^"]*)""#).unwrap());
static NAME_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*name[ \t]*=[ \t]*"([^"]*)""#).unwrap());

/// Shape in which a dependency declares its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyShape {
    /// `dep = { path = "...", version = "1.0" }`
    InlineTable,
    /// `dep = "1.0"`
    Bare,
    /// `[dependencies.dep]` followed by `version = "1.0"`
    Table,
}

/// A Cargo.toml manifest held as text.
#[derive(Debug, Clone)]
pub struct CargoManifest {
    pub path: PathBuf,
    content: String,
    original: String,
}

impl CargoManifest {
    /// Load a Cargo.toml file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_content(path, content))
    }

    /// Build a manifest from text already in memory.
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            original: content.clone(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// `name` from the `[package]` section.
    pub fn package_name(&self) -> Option<&str> {
        package_name(&self.content)
    }

    /// The package's own version, from the first package section declaring one.
    pub fn version(&self) -> Option<&str> {
        package_version(&self.content)
    }

    /// Replace the package version. Returns `true` when the text changed.
    pub fn set_version(&mut self, new_version: &str) -> bool {
        match set_package_version(&self.content, new_version) {
            Some(updated) if updated != self.content => {
                self.content = updated;
                true
            }
            _ => false,
        }
    }

    /// Version recorded for `dep_name`, using the first shape that matches.
    pub fn dependency_version(&self, dep_name: &str) -> Option<&str> {
        dependency_version(&self.content, dep_name).map(|(_, version)| version)
    }

    /// Whether this manifest declares a versioned dependency on `dep_name`.
    pub fn depends_on(&self, dep_name: &str) -> bool {
        dependency_version(&self.content, dep_name).is_some()
    }

    /// Rewrite every version declared for `dep_name`. Returns `true` when the
    /// text changed.
    pub fn update_dependency(&mut self, dep_name: &str, new_version: &str) -> bool {
        let updated = set_dependency_version(&self.content, dep_name, new_version);
        if updated != self.content {
            self.content = updated;
            true
        } else {
            false
        }
    }

    /// Whether the in-memory text differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.content != self.original
    }

    /// Save the manifest back to disk if it was modified.
    ///
    /// Returns `true` when a write happened.
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

/// Byte range from the end of a header match to the next table header.
fn section_after(content: &str, header_end: usize) -> Range<usize> {
    let end = TABLE_HEADER_RE
        .find(&content[header_end..])
        .map(|m| header_end + m.start())
        .unwrap_or(content.len());
    header_end..end
}

/// Span of the first capture of `field` inside the first package section
/// where it appears.
fn package_field_span(content: &str, field: &Regex, plain_package_only: bool) -> Option<Range<usize>> {
    PACKAGE_HEADER_RE
        .find_iter(content)
        .filter(|header| !plain_package_only || !header.as_str().contains("workspace"))
        .find_map(|header| {
            let section = section_after(content, header.end());
            let caps = field.captures(&content[section.clone()])?;
            let value = caps.get(1)?;
            Some(section.start + value.start()..section.start + value.end())
        })
}

/// The package's own version, if declared as a quoted string.
pub fn package_version(content: &str) -> Option<&str> {
    package_field_span(content, &VERSION_FIELD_RE, false).map(|span| &content[span])
}

/// `name` from the `[package]` section.
pub fn package_name(content: &str) -> Option<&str> {
    package_field_span(content, &NAME_FIELD_RE, true).map(|span| &content[span])
}

/// Replace the package's own version. `None` when no version declaration exists.
pub fn set_package_version(content: &str, new_version: &str) -> Option<String> {
    let span = package_field_span(content, &VERSION_FIELD_RE, false)?;
    let mut updated = content.to_string();
    updated.replace_range(span, new_version);
    Some(updated)
}

fn inline_table_re(dep_name: &str) -> Regex {
    let pattern = format!(
        r#"(?m)^([ \t]*"?{}"?[ \t]*=[ \t]*\{{(?:[^}}]*?,)?\s*version\s*=\s*")([^"]*)(")"#,
        regex::escape(dep_name)
    );
    Regex::new(&pattern).expect("escaped dependency pattern is valid")
}

fn bare_re(dep_name: &str) -> Regex {
    let pattern = format!(
        r#"(?m)^([ \t]*"?{}"?[ \t]*=[ \t]*")([^"]*)(")"#,
        regex::escape(dep_name)
    );
    Regex::new(&pattern).expect("escaped dependency pattern is valid")
}

fn table_header_re(dep_name: &str) -> Regex {
    let pattern = format!(
        r#"(?m)^[ \t]*\[[ \t]*(?:target\.[^\]\n]+\.)?(?:dev-|build-)?dependencies\.(?:"{0}"|{0})[ \t]*\][ \t]*(?:#.*)?\r?$"#,
        regex::escape(dep_name)
    );
    Regex::new(&pattern).expect("escaped dependency pattern is valid")
}

/// Spans of the version payload of every `[*dependencies.<dep>]` table.
fn table_version_spans(content: &str, dep_name: &str) -> Vec<Range<usize>> {
    table_header_re(dep_name)
        .find_iter(content)
        .filter_map(|header| {
            let section = section_after(content, header.end());
            let caps = VERSION_FIELD_RE.captures(&content[section.clone()])?;
            let value = caps.get(1)?;
            Some(section.start + value.start()..section.start + value.end())
        })
        .collect()
}

/// Bodies of every `[dependencies]`-like table: plain, dev, build,
/// `workspace.` and `target.<cfg>.` variants.
fn dependency_sections(content: &str) -> Vec<Range<usize>> {
    DEPENDENCY_TABLE_RE
        .find_iter(content)
        .map(|header| section_after(content, header.end()))
        .collect()
}

/// Spans of the second capture of `pattern`, searched only inside
/// dependency tables so keys like `build` or `resolver` never match.
fn keyed_version_spans(content: &str, pattern: &Regex) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for section in dependency_sections(content) {
        for caps in pattern.captures_iter(&content[section.clone()]) {
            if let Some(value) = caps.get(2) {
                spans.push(section.start + value.start()..section.start + value.end());
            }
        }
    }
    spans
}

/// Version recorded for `dep_name` together with the shape it was found in.
///
/// Shapes are tried in order: inline table, bare string, dotted table.
pub fn dependency_version<'a>(content: &'a str, dep_name: &str) -> Option<(DependencyShape, &'a str)> {
    let shapes = [
        (DependencyShape::InlineTable, keyed_version_spans(content, &inline_table_re(dep_name))),
        (DependencyShape::Bare, keyed_version_spans(content, &bare_re(dep_name))),
        (DependencyShape::Table, table_version_spans(content, dep_name)),
    ];
    shapes
        .into_iter()
        .find_map(|(shape, spans)| spans.into_iter().next().map(|span| (shape, &content[span])))
}

/// Rewrite every version declared for `dep_name`, in all three shapes.
pub fn set_dependency_version(content: &str, dep_name: &str, new_version: &str) -> String {
    let mut spans = keyed_version_spans(content, &inline_table_re(dep_name));
    spans.extend(keyed_version_spans(content, &bare_re(dep_name)));
    spans.extend(table_version_spans(content, dep_name));
    spans.sort_by_key(|span| span.start);
    spans.dedup();

    let mut updated = content.to_string();
    // Later spans first so earlier offsets stay valid.
    for span in spans.into_iter().rev() {
        updated.replace_range(span, new_version);
    }
    updated
}

#[cfg(test)]
#[path = "cargo_tests.rs"]
mod tests;
