//! Site configuration module.
//!
//! Handles loading, validating, and persisting the per-vault settings file.
//! The file is hidden so it is never published itself.
//!
//! ## Config File Location
//!
//! ```text
//! vault/
//! ├── .vault-site.toml     # Site settings (this module)
//! ├── .obsidian/           # Appearance, themes, snippets (see `config_dir`)
//! ├── index.md
//! └── notes/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "dist"             # Output folder, relative to the vault root
//! allow_private_folders = false   # Honour `locked_folders`
//! locked_folders = []             # Folders kept off the site when private folders are on
//! previous_output_dirs = []       # Every output folder ever used (maintained automatically)
//! # site_name = "My Notes"        # Sidebar header (defaults to the vault folder name)
//! config_dir = ".obsidian"        # Where appearance.json, themes/ and snippets/ live
//! stylesheets = []                # Extra vault-relative CSS files bundled into style.css
//! web_fonts = true                # Check Google Fonts for the configured font
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Output Directory History
//!
//! `previous_output_dirs` only ever grows. A generation run records the
//! current output directory there and saves the file before writing
//! anything, so an old output tree stays excluded after the setting changes,
//! even if that run is interrupted.

use crate::exclusion::ExclusionRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the settings file inside the vault root.
pub const CONFIG_FILE: &str = ".vault-site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `.vault-site.toml`.
///
/// All fields have defaults; a missing file is the stock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Output folder. Relative paths are resolved against the vault root.
    pub output_dir: String,
    /// When set, everything under `locked_folders` stays off the site.
    pub allow_private_folders: bool,
    /// Vault folders hidden from the site while private folders are enabled.
    pub locked_folders: Vec<String>,
    /// Every output folder used so far. Always excluded.
    pub previous_output_dirs: Vec<String>,
    /// Sidebar header. Defaults to the vault's folder name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Vault-relative folder holding `appearance.json`, `themes/` and `snippets/`.
    pub config_dir: String,
    /// Extra vault-relative stylesheets appended to `style.css`.
    pub stylesheets: Vec<String>,
    /// Probe Google Fonts for the configured font family.
    pub web_fonts: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: "dist".to_string(),
            allow_private_folders: false,
            locked_folders: Vec::new(),
            previous_output_dirs: Vec::new(),
            site_name: None,
            config_dir: ".obsidian".to_string(),
            stylesheets: Vec::new(),
            web_fonts: true,
        }
    }
}

impl SiteConfig {
    /// Bring folder paths into the form the exclusion rules compare against.
    ///
    /// Empty entries and duplicates are dropped from the folder lists.
    pub fn normalize(&mut self) {
        self.output_dir = normalize_output_dir(&self.output_dir);
        self.config_dir = normalize_folder(&self.config_dir);
        self.locked_folders = normalize_list(&self.locked_folders);
        self.previous_output_dirs = self
            .previous_output_dirs
            .iter()
            .map(|d| normalize_output_dir(d))
            .fold(Vec::new(), push_unique);
        self.stylesheets = normalize_list(&self.stylesheets);
        if self
            .site_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.site_name = None;
        }
    }

    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.output_dir.as_str(), "" | "." | ".." | "/") {
            return Err(ConfigError::Validation(format!(
                "output_dir must name a folder, got {:?}",
                self.output_dir
            )));
        }
        if self.config_dir.is_empty() {
            return Err(ConfigError::Validation(
                "config_dir must not be empty".into(),
            ));
        }
        if let Some(sheet) = self
            .stylesheets
            .iter()
            .find(|s| s.split('/').any(|seg| seg == ".."))
        {
            return Err(ConfigError::Validation(format!(
                "stylesheet {sheet:?} is outside the vault"
            )));
        }
        Ok(())
    }

    /// The exclusion rules for a run with this configuration.
    pub fn rules(&self) -> ExclusionRules {
        ExclusionRules {
            output_dir: self.output_dir.clone(),
            previous_output_dirs: self.previous_output_dirs.clone(),
            allow_private_folders: self.allow_private_folders,
            locked_folders: self.locked_folders.clone(),
        }
    }

    /// The exclusion rules for a vault stored at `vault_root`.
    ///
    /// Absolute output folders are rewritten to vault paths so they match the
    /// files they contain. Folders outside the vault cannot hold vault files and
    /// match nothing. An output folder that is the vault root itself is rejected.
    pub fn rules_in(&self, vault_root: &Path) -> Result<ExclusionRules, ConfigError> {
        let output_dir = match vault_relative(&self.output_dir, vault_root) {
            Some(rel) if rel.is_empty() => {
                return Err(ConfigError::Validation(format!(
                    "output_dir {:?} is the vault root",
                    self.output_dir
                )));
            }
            Some(rel) => rel,
            None => String::new(),
        };
        let previous_output_dirs = self
            .previous_output_dirs
            .iter()
            .filter_map(|dir| vault_relative(dir, vault_root))
            .fold(Vec::new(), push_unique);

        Ok(ExclusionRules {
            output_dir,
            previous_output_dirs,
            allow_private_folders: self.allow_private_folders,
            locked_folders: self.locked_folders.clone(),
        })
    }

    /// Add the current output directory to the history.
    ///
    /// Returns `true` if the history changed and needs saving.
    pub fn record_output_dir(&mut self) -> bool {
        if self.previous_output_dirs.contains(&self.output_dir) {
            return false;
        }
        self.previous_output_dirs.push(self.output_dir.clone());
        true
    }

    /// Add a folder to the locked set. Returns `false` if it was already there.
    pub fn lock_folder(&mut self, folder: &str) -> Result<bool, ConfigError> {
        let folder = checked_folder(folder)?;
        if self.locked_folders.contains(&folder) {
            return Ok(false);
        }
        self.locked_folders.push(folder);
        Ok(true)
    }

    /// Remove a folder from the locked set. Returns `false` if it was not locked.
    pub fn unlock_folder(&mut self, folder: &str) -> Result<bool, ConfigError> {
        let folder = checked_folder(folder)?;
        let before = self.locked_folders.len();
        self.locked_folders.retain(|f| *f != folder);
        Ok(self.locked_folders.len() != before)
    }
}

fn checked_folder(folder: &str) -> Result<String, ConfigError> {
    let folder = normalize_folder(folder);
    if folder.is_empty() || folder.split('/').any(|seg| seg == "..") {
        return Err(ConfigError::Validation(format!(
            "{folder:?} is not a folder inside the vault"
        )));
    }
    Ok(folder)
}

/// `./notes/` → `notes`. Vault paths never carry leading or trailing slashes.
pub fn normalize_folder(path: &str) -> String {
    let mut p = path.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p.trim_matches('/').to_string()
}

/// Like [`normalize_folder`], but an absolute output directory stays absolute.
fn normalize_output_dir(path: &str) -> String {
    if Path::new(path.trim()).is_absolute() {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }.to_string()
    } else {
        normalize_folder(path)
    }
}

/// Vault path of an output folder, or `None` when it lies outside the vault.
///
/// Relative folders already are vault paths. Absolute ones are compared with
/// symlinks resolved, so `/tmp/vault/dist` and `/private/tmp/vault/dist` agree
/// even before the folder exists. The vault root itself yields `Some("")`.
pub fn vault_relative(dir: &str, vault_root: &Path) -> Option<String> {
    let path = Path::new(dir);
    if !path.is_absolute() {
        return Some(dir.to_string());
    }
    let root = resolve_existing(vault_root);
    let resolved = resolve_existing(path);
    let rel = resolved.strip_prefix(&root).ok()?;
    Some(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Canonicalize the longest existing ancestor and re-attach the rest.
fn resolve_existing(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing) {
            resolved.extend(missing.iter().rev());
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn normalize_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| normalize_folder(s))
        .filter(|s| !s.is_empty())
        .fold(Vec::new(), push_unique)
}

fn push_unique(mut acc: Vec<String>, item: String) -> Vec<String> {
    if !item.is_empty() && !acc.contains(&item) {
        acc.push(item);
    }
    acc
}

// =============================================================================
// Config loading and saving
// =============================================================================

/// Location of the settings file for a vault.
pub fn config_path(vault_root: &Path) -> PathBuf {
    vault_root.join(CONFIG_FILE)
}

/// Parse, normalize and validate config text.
pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    let mut config: SiteConfig = toml::from_str(content)?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Load a settings file. A missing file yields the stock defaults.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    parse_config(&fs::read_to_string(path)?)
}

/// Write a settings file, replacing any previous content.
pub fn save_config_file(config: &SiteConfig, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Load `.vault-site.toml` from the vault root.
pub fn load_config(vault_root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_file(&config_path(vault_root))
}

/// Save `.vault-site.toml` into the vault root.
pub fn save_config(config: &SiteConfig, vault_root: &Path) -> Result<(), ConfigError> {
    save_config_file(config, &config_path(vault_root))
}

/// Returns a fully-commented stock `.vault-site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Vault Site Configuration
# ========================
# Save as .vault-site.toml in the vault root.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Folder the site is written to. Relative paths are resolved against the
# vault root. The folder is never published into itself.
output_dir = "dist"

# ---------------------------------------------------------------------------
# Private folders
# ---------------------------------------------------------------------------
# When true, every folder in locked_folders (and everything below it) is
# left out of the navigation and the output.
allow_private_folders = false

# Vault-relative folder paths, e.g. ["journal", "work/clients"].
locked_folders = []

# Every output folder used so far. Maintained automatically so an old site
# is not published into a new one after output_dir changes.
previous_output_dirs = []

# ---------------------------------------------------------------------------
# Appearance
# ---------------------------------------------------------------------------
# Sidebar header. Defaults to the vault folder name.
# site_name = "My Notes"

# Folder holding appearance.json, themes/ and snippets/.
config_dir = ".obsidian"

# Extra vault-relative CSS files appended to assets/style.css.
stylesheets = []

# Check Google Fonts for the font family set in appearance.json and
# import it when available. Disable for offline builds.
web_fonts = true
"##
}
