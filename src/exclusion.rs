//! Publication eligibility.
//!
//! One pure predicate, [`ExclusionRules::is_excluded`], consulted both when
//! building the sidebar and when selecting files to write. Keeping a single
//! implementation means a note can never be linked from navigation without
//! being published, or published without appearing in navigation.
//!
//! ## Precedence
//!
//! 1. The current output directory is always excluded.
//! 2. Every previously used output directory is always excluded.
//! 3. Locked folders are excluded only while `allow_private_folders` is on.
//!
//! Rules 1 and 2 ignore the privacy flag: turning privacy off must never make
//! the generator publish its own earlier output.
//!
//! Matching is lexical on vault paths. A folder rule covers the folder itself
//! and everything below it (`path == rule` or `path` starts with `rule/`), and
//! no descendant can opt back in.

use serde::Serialize;

/// The exclusion configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionRules {
    pub output_dir: String,
    pub previous_output_dirs: Vec<String>,
    pub allow_private_folders: bool,
    pub locked_folders: Vec<String>,
}

impl ExclusionRules {
    pub fn is_excluded(&self, path: &str) -> bool {
        if is_within(path, &self.output_dir) {
            return true;
        }
        if self
            .previous_output_dirs
            .iter()
            .any(|dir| is_within(path, dir))
        {
            return true;
        }
        if !self.allow_private_folders {
            return false;
        }
        self.locked_folders
            .iter()
            .any(|folder| is_within(path, folder))
    }
}

/// `path` equals `folder` or lies beneath it.
///
/// An empty rule never matches; it would otherwise swallow the whole vault.
pub fn is_within(path: &str, folder: &str) -> bool {
    if folder.is_empty() {
        return false;
    }
    path == folder
        || path
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Hidden entries (`.git`, `.obsidian`, …) are never published.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}
