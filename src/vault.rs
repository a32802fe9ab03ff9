//! Vault access and the immutable per-run snapshot.
//!
//! A generation run never walks the live filesystem twice. [`VaultSource::snapshot`]
//! freezes the tree into a [`VaultSnapshot`]: an arena of [`DocumentNode`]s keyed
//! by vault path, plus a parent → children index that preserves enumeration
//! order. Everything downstream (navigation, file selection, link resolution)
//! reads that value, so a note created or deleted mid-run cannot make the
//! sidebar and the written files disagree.
//!
//! ## Enumeration Order
//!
//! [`FsVault`] walks with entries sorted by file name, so the order of
//! [`VaultSnapshot::files`] is stable across runs. That order drives the
//! processing loop; only the sidebar is re-sorted for display.
//!
//! ## Hidden Entries
//!
//! Entries whose name starts with `.` (`.obsidian/`, `.git/`, the config file)
//! are not indexed by [`FsVault`] at all. They can still be read by path,
//! which is how appearance settings under the config directory are found.

use crate::exclusion::is_hidden_name;
use crate::types::{DocumentNode, NodeKind};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),
    #[error("Path escapes the vault: {0}")]
    InvalidPath(String),
    #[error("Not valid UTF-8: {0}")]
    Encoding(String),
}

/// Document-tree provider.
///
/// The pipeline only ever needs these operations, so tests can substitute an
/// in-memory vault.
pub trait VaultSource {
    /// Display name of the vault (used as the sidebar header).
    fn name(&self) -> &str;

    /// Take a consistent snapshot of every folder and file.
    fn snapshot(&self) -> Result<VaultSnapshot, VaultError>;

    /// Raw bytes of a file.
    fn read(&self, path: &str) -> Result<Vec<u8>, VaultError>;

    /// UTF-8 text of a file.
    fn read_to_string(&self, path: &str) -> Result<String, VaultError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| VaultError::Encoding(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool;

    /// Location on disk, for vaults that have one.
    fn root_dir(&self) -> Option<&Path> {
        None
    }
}

/// Frozen view of the vault tree for one run.
#[derive(Debug, Clone)]
pub struct VaultSnapshot {
    nodes: BTreeMap<String, DocumentNode>,
    children: BTreeMap<String, Vec<String>>,
    files: Vec<String>,
}

impl Default for VaultSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultSnapshot {
    /// An empty vault: just the root folder.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), DocumentNode::new("", NodeKind::Folder));
        Self {
            nodes,
            children: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Build a snapshot from file paths, creating parent folders implicitly.
    pub fn from_files<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut snapshot = Self::new();
        for path in paths {
            snapshot.insert_file(path.as_ref());
        }
        snapshot
    }

    /// Add a folder (and any missing ancestors). Re-inserting is a no-op.
    pub fn insert_folder(&mut self, path: &str) {
        let path = path.trim_matches('/');
        if self.nodes.contains_key(path) {
            return;
        }
        self.link_parent(path);
        self.nodes
            .insert(path.to_string(), DocumentNode::new(path, NodeKind::Folder));
    }

    /// Add a file (and any missing ancestor folders). Re-inserting is a no-op.
    pub fn insert_file(&mut self, path: &str) {
        let path = path.trim_matches('/');
        if path.is_empty() || self.nodes.contains_key(path) {
            return;
        }
        self.link_parent(path);
        self.nodes.insert(path.to_string(), DocumentNode::file(path));
        self.files.push(path.to_string());
    }

    fn link_parent(&mut self, path: &str) {
        let parent = parent_path(path);
        if !self.nodes.contains_key(parent) {
            self.insert_folder(parent);
        }
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(path.to_string());
    }

    pub fn root(&self) -> &DocumentNode {
        &self.nodes[""]
    }

    pub fn get(&self, path: &str) -> Option<&DocumentNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Direct children of a folder, in enumeration order.
    pub fn children(&self, path: &str) -> impl Iterator<Item = &DocumentNode> {
        self.children
            .get(path)
            .into_iter()
            .flatten()
            .filter_map(|p| self.nodes.get(p))
    }

    /// Every file (documents and assets), in enumeration order.
    pub fn files(&self) -> impl Iterator<Item = &DocumentNode> {
        self.files.iter().filter_map(|p| self.nodes.get(p))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Vault path of the folder containing `path` (`""` for top-level entries).
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// A vault stored as a plain directory.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    name: String,
}

impl FsVault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(VaultError::VaultNotFound(root));
        }
        let name = match root.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            // `.` and friends have no file name of their own
            None => fs::canonicalize(&root)?
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Vault".to_string()),
        };
        Ok(Self { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault-relative path.
    pub fn full_path(&self, path: &str) -> Result<PathBuf, VaultError> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(VaultError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path.trim_start_matches('/')))
    }
}

impl VaultSource for FsVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Result<VaultSnapshot, VaultError> {
        let mut snapshot = VaultSnapshot::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_name(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| VaultError::InvalidPath(entry.path().display().to_string()))?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                snapshot.insert_folder(&rel);
            } else if entry.path().is_file() {
                snapshot.insert_file(&rel);
            }
        }
        Ok(snapshot)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        Ok(fs::read(self.full_path(path)?)?)
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn root_dir(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn from_files_creates_parent_folders() {
        let snapshot = VaultSnapshot::from_files(["notes/deep/a.md", "index.md"]);

        assert_eq!(snapshot.get("notes").unwrap().kind, NodeKind::Folder);
        assert_eq!(snapshot.get("notes/deep").unwrap().kind, NodeKind::Folder);
        assert_eq!(snapshot.get("notes/deep/a.md").unwrap().kind, NodeKind::Document);
        assert_eq!(snapshot.file_count(), 2);
    }

    #[test]
    fn children_keep_insertion_order() {
        let snapshot = VaultSnapshot::from_files(["z.md", "a.md", "m/x.png"]);
        let names: Vec<&str> = snapshot.children("").map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["z.md", "a.md", "m"]);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut snapshot = VaultSnapshot::from_files(["a.md"]);
        snapshot.insert_file("a.md");
        snapshot.insert_folder("");
        assert_eq!(snapshot.file_count(), 1);
        assert_eq!(snapshot.children("").count(), 1);
    }

    #[test]
    fn parent_path_of_top_level_is_root() {
        assert_eq!(parent_path("a.md"), "");
        assert_eq!(parent_path("a/b/c.md"), "a/b");
    }

    #[test]
    fn open_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = FsVault::open(tmp.path().join("nope"));
        assert!(matches!(result, Err(VaultError::VaultNotFound(_))));
    }

    #[test]
    fn fs_snapshot_is_sorted_and_skips_hidden() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.md", "# B");
        write(tmp.path(), "a.md", "# A");
        write(tmp.path(), "notes/c.md", "# C");
        write(tmp.path(), ".obsidian/appearance.json", "{}");
        write(tmp.path(), ".vault-site.toml", "");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let vault = FsVault::open(tmp.path()).unwrap();
        let snapshot = vault.snapshot().unwrap();

        let files: Vec<&str> = snapshot.files().map(|n| n.path.as_str()).collect();
        assert_eq!(files, vec!["a.md", "b.md", "notes/c.md"]);
        assert!(snapshot.get("empty").unwrap().is_folder());
        assert!(!snapshot.contains(".obsidian"));
    }

    #[test]
    fn hidden_files_remain_readable_by_path() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".obsidian/appearance.json", "{\"accentColor\":\"#f00\"}");

        let vault = FsVault::open(tmp.path()).unwrap();
        assert!(vault.exists(".obsidian/appearance.json"));
        let text = vault.read_to_string(".obsidian/appearance.json").unwrap();
        assert!(text.contains("accentColor"));
    }

    #[test]
    fn read_rejects_parent_traversal() {
        let tmp = TempDir::new().unwrap();
        let vault = FsVault::open(tmp.path()).unwrap();
        assert!(matches!(
            vault.read("../secret.txt"),
            Err(VaultError::InvalidPath(_))
        ));
        assert!(!vault.exists("../secret.txt"));
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bin.md"), [0xff, 0xfe, 0x00]).unwrap();
        let vault = FsVault::open(tmp.path()).unwrap();
        assert!(matches!(
            vault.read_to_string("bin.md"),
            Err(VaultError::Encoding(_))
        ));
    }

    #[test]
    fn vault_name_is_directory_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("My Notes");
        fs::create_dir_all(&root).unwrap();
        let vault = FsVault::open(&root).unwrap();
        assert_eq!(vault.name(), "My Notes");
    }
}
