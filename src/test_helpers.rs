//! Shared test utilities for the vault-site test suite.
//!
//! Provides vault fixtures (on disk and in memory), a renderer that fails on
//! demand, and navigation tree assertions.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let vault = MemoryVault::new(&[("index.md", "# Home"), ("notes/a.md", "A")]);
//! let nav = build_nav_tree(&vault.snapshot().unwrap(), &rules);
//!
//! assert_nav_shape(&nav, &[("notes", &["a"]), ("index", &[])]);
//! assert_ordered_at_every_level(&nav);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

use crate::navigation::compare_names;
use crate::render::{MarkdownRenderer, RenderError, Renderer};
use crate::types::NavItem;
use crate::vault::{VaultError, VaultSnapshot, VaultSource};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(path, content)` pairs into a fresh temp directory.
pub fn create_vault(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), files);
    tmp
}

/// Write `(path, content)` pairs below `root`, creating folders as needed.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
}

/// A vault held in memory. Hidden paths are readable but not listed,
/// matching [`crate::vault::FsVault`].
pub struct MemoryVault {
    name: String,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryVault {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            name: "Test Vault".to_string(),
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
                .collect(),
        }
    }

    pub fn with_bytes(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.insert(path.to_string(), bytes.to_vec());
        self
    }
}

impl VaultSource for MemoryVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Result<VaultSnapshot, VaultError> {
        Ok(VaultSnapshot::from_files(
            self.files
                .keys()
                .filter(|p| !p.split('/').any(|seg| seg.starts_with('.'))),
        ))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        self.files.get(path).cloned().ok_or_else(|| {
            VaultError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{path} not in vault"),
            ))
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// Renders normally, except for the listed source paths.
pub struct FailingRenderer {
    fail_on: Vec<String>,
    inner: MarkdownRenderer,
}

impl FailingRenderer {
    pub fn new(fail_on: &[&str]) -> Self {
        Self {
            fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
            inner: MarkdownRenderer::new(),
        }
    }
}

impl Renderer for FailingRenderer {
    fn render(&self, markdown: &str, source_path: &str) -> Result<String, RenderError> {
        if self.fail_on.iter().any(|p| p == source_path) {
            return Err(RenderError::Failed {
                path: source_path.to_string(),
                message: "renderer exploded".to_string(),
            });
        }
        self.inner.render(markdown, source_path)
    }
}

// =========================================================================
// Navigation helpers
// =========================================================================

/// Entry names at one level, in order.
pub fn nav_names(items: &[NavItem]) -> Vec<&str> {
    items.iter().map(|n| n.name.as_str()).collect()
}

/// Child names under a given top-level entry. Panics if the entry is missing.
pub fn nav_children<'a>(items: &'a [NavItem], parent: &str) -> Vec<&'a str> {
    items
        .iter()
        .find(|n| n.name == parent)
        .map(|n| nav_names(&n.children))
        .unwrap_or_else(|| {
            let names = nav_names(items);
            panic!("nav entry '{parent}' not found. Available: {names:?}")
        })
}

/// Assert that the top two levels of the navigation tree match an expected shape.
///
/// Each entry is `(name, children)`. Use `&[]` for documents and empty folders.
pub fn assert_nav_shape(items: &[NavItem], expected: &[(&str, &[&str])]) {
    let expected_names: Vec<&str> = expected.iter().map(|(n, _)| *n).collect();
    assert_eq!(nav_names(items), expected_names, "nav top-level names mismatch");

    for (name, children) in expected {
        assert_eq!(
            nav_children(items, name),
            children.to_vec(),
            "nav children of '{name}' mismatch"
        );
    }
}

/// Assert folders-first, then name order, among siblings at every depth.
pub fn assert_ordered_at_every_level(items: &[NavItem]) {
    for pair in items.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ordered = match (a.is_folder, b.is_folder) {
            (true, false) => true,
            (false, true) => false,
            _ => compare_names(&a.name, &b.name).is_le(),
        };
        assert!(ordered, "'{}' sorted before '{}'", a.name, b.name);
    }
    for item in items {
        assert_ordered_at_every_level(&item.children);
    }
}
