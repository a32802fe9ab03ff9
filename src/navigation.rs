//! Sidebar navigation tree.
//!
//! Built once per run from the [`VaultSnapshot`] and shared read-only by every
//! page. Only folders and markdown documents become entries; other files are
//! still published as assets but never linked from the sidebar.
//!
//! ## Ordering
//!
//! Siblings sort folders first, then by display name. Names collate the way
//! a file browser does: base letters first (`É` sorts with `E`), then accents,
//! then case with lowercase ahead of uppercase. The exact string breaks any
//! remaining tie, so the order is a pure function of the filtered tree.
//!
//! ## Empty Folders
//!
//! Folders are kept even when nothing inside them survives filtering. An empty
//! folder shows up as an empty, expanded branch; it is not pruned.

use crate::exclusion::{ExclusionRules, is_hidden_name};
use crate::types::{DocumentNode, NavItem, NodeKind};
use crate::vault::VaultSnapshot;
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Build the navigation tree for the whole vault.
pub fn build_nav_tree(snapshot: &VaultSnapshot, rules: &ExclusionRules) -> Vec<NavItem> {
    build_level(snapshot, snapshot.root(), rules)
}

fn build_level(
    snapshot: &VaultSnapshot,
    folder: &DocumentNode,
    rules: &ExclusionRules,
) -> Vec<NavItem> {
    let mut items: Vec<NavItem> = snapshot
        .children(&folder.path)
        .filter(|child| !is_hidden_name(&child.name))
        .filter(|child| !rules.is_excluded(&child.path))
        .filter_map(|child| match child.kind {
            NodeKind::Folder => Some(NavItem {
                name: child.name.clone(),
                path: child.path.clone(),
                is_folder: true,
                children: build_level(snapshot, child, rules),
            }),
            NodeKind::Document => Some(NavItem {
                name: child.display_name().to_string(),
                path: child.path.clone(),
                is_folder: false,
                children: Vec::new(),
            }),
            NodeKind::Asset => None,
        })
        .collect();

    items.sort_by(compare_entries);
    items
}

fn compare_entries(a: &NavItem, b: &NavItem) -> Ordering {
    b.is_folder
        .cmp(&a.is_folder)
        .then_with(|| compare_names(&a.name, &b.name))
}

/// Accent- and case-insensitive comparison, refined by accents, then case,
/// then the exact string.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| with_accents(a).cmp(&with_accents(b)))
        .then_with(|| uppercase_positions(a).cmp(&uppercase_positions(b)))
        .then_with(|| a.cmp(b))
}

fn base_letters(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn with_accents(name: &str) -> String {
    name.nfd().flat_map(char::to_lowercase).collect()
}

// `false` sorts first, which puts lowercase ahead of uppercase.
fn uppercase_positions(name: &str) -> Vec<bool> {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
        .collect()
}

/// Visit every document entry depth-first, in display order.
pub fn documents(items: &[NavItem]) -> Vec<&NavItem> {
    let mut out = Vec::new();
    collect_documents(items, &mut out);
    out
}

fn collect_documents<'a>(items: &'a [NavItem], out: &mut Vec<&'a NavItem>) {
    for item in items {
        if item.is_folder {
            collect_documents(&item.children, out);
        } else {
            out.push(item);
        }
    }
}
