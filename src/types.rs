//! Shared types used across the generation pipeline.
//!
//! [`DocumentNode`] is what the vault snapshot hands out; [`NavItem`] is the
//! derived sidebar model built once per run and shared read-only by every
//! page render.

use serde::Serialize;

/// Extension (without the dot) that marks a file as a publishable document.
pub const DOCUMENT_EXTENSION: &str = "md";

/// What a vault entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    /// A markdown note, rendered to HTML.
    Document,
    /// Any other file, copied verbatim.
    Asset,
}

/// A node in the vault tree.
///
/// `path` is the slash-separated vault-relative identifier (`notes/a.md`);
/// the root folder has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentNode {
    pub path: String,
    pub kind: NodeKind,
    /// Leaf file or folder name, extension included.
    pub name: String,
}

impl DocumentNode {
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, kind, name }
    }

    /// Classify a file path by extension.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let kind = if is_document_path(&path) {
            NodeKind::Document
        } else {
            NodeKind::Asset
        };
        Self::new(path, kind)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Name shown to readers: documents drop their `.md` extension.
    pub fn display_name(&self) -> &str {
        match self.kind {
            NodeKind::Document => strip_document_extension(&self.name),
            _ => &self.name,
        }
    }
}

/// Whether a path names a markdown document (`*.md`, case-sensitive).
pub fn is_document_path(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext == DOCUMENT_EXTENSION,
        None => false,
    }
}

/// `Note.md` → `Note`; anything else is returned unchanged.
pub fn strip_document_extension(name: &str) -> &str {
    if is_document_path(name) {
        &name[..name.len() - DOCUMENT_EXTENSION.len() - 1]
    } else {
        name
    }
}

/// Navigation tree entry (folders and documents only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: String,
    /// Vault path of the folder or document this entry stands for.
    pub path: String,
    pub is_folder: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}
