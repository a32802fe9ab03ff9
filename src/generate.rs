//! Static site generation.
//!
//! [`generate_with`] runs one full build of the vault into the output
//! directory. Every run is a complete rebuild: nothing is diffed against a
//! previous run, and files left behind by an earlier configuration are not
//! removed.
//!
//! ## Run Sequence
//!
//! 1. Record the output directory in the config history and save the config,
//!    before anything is written.
//! 2. Create the output root.
//! 3. Snapshot the vault and build the navigation tree once.
//! 4. Export `assets/style.css` and `assets/custom.css`.
//! 5. Split the snapshot's files into documents and assets, dropping
//!    everything the exclusion rules reject.
//! 6. Copy assets byte for byte.
//! 7. Render and write one page per document.
//!
//! Steps 1–4 are fatal on failure. In steps 6 and 7 each item stands alone:
//! a failure is recorded in the [`GenerateReport`], reported as
//! [`GenerateEvent::ItemFailed`], and the run moves on.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── assets/
//! │   ├── style.css        # Base theme + vault theme, snippets, extra sheets
//! │   └── custom.css       # Accent/font overrides + layout
//! ├── index.html           # index.md
//! ├── notes/
//! │   ├── a.html           # notes/a.md
//! │   └── diagram.png      # copied verbatim
//! └── ...
//! ```
//!
//! Processing follows the snapshot's enumeration order, one item at a time.
//! The navigation tree is shared read-only by every page.

use crate::config::{self, ConfigError, SiteConfig};
use crate::exclusion::{ExclusionRules, is_hidden_name};
use crate::links::VaultLinkResolver;
use crate::navigation::build_nav_tree;
use crate::page::{PageContext, assemble_page};
use crate::paths::output_path;
use crate::render::{MarkdownRenderer, RenderError, Renderer};
use crate::styles::{FontProbe, export_styles, load_appearance};
use crate::types::{DocumentNode, NavItem, NodeKind};
use crate::vault::{FsVault, VaultError, VaultSnapshot, VaultSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A progress event is sent after every this many documents.
pub const PROGRESS_INTERVAL: usize = 10;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot write stylesheets: {0}")]
    Styles(#[source] std::io::Error),
}

/// Why a single document or asset could not be published.
#[derive(Error, Debug)]
enum ItemError {
    #[error("read failed: {0}")]
    Read(#[from] VaultError),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Progress of a run, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateEvent {
    Started {
        documents: usize,
        assets: usize,
    },
    Progress {
        processed: usize,
        total: usize,
    },
    ItemFailed {
        path: String,
        error: String,
    },
    Completed {
        pages: usize,
        assets: usize,
        failed: usize,
    },
}

/// One document or asset that was skipped because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub path: String,
    pub error: String,
}

/// What a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub output_root: PathBuf,
    /// Output-relative paths of generated pages, in processing order.
    pub pages: Vec<String>,
    /// Output-relative paths of copied assets, in processing order.
    pub assets: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl GenerateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The collaborators a run delegates to.
pub struct Pipeline<'a> {
    pub vault: &'a dyn VaultSource,
    pub renderer: &'a dyn Renderer,
    pub fonts: &'a dyn FontProbe,
}

/// Where a vault's site is written.
pub fn output_root(vault_root: &Path, config: &SiteConfig) -> PathBuf {
    vault_root.join(&config.output_dir)
}

/// Build an on-disk vault with the bundled markdown renderer.
///
/// The config is saved back to `.vault-site.toml` in the vault root when the
/// output directory history changes.
pub fn generate(
    vault: &FsVault,
    config: &mut SiteConfig,
    fonts: &dyn FontProbe,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateReport, GenerateError> {
    let renderer = MarkdownRenderer::new();
    let pipeline = Pipeline {
        vault,
        renderer: &renderer,
        fonts,
    };
    let config_file = config::config_path(vault.root());
    let root = output_root(vault.root(), config);
    generate_with(&pipeline, config, Some(&config_file), &root, events)
}

/// Run a full build with explicit collaborators.
///
/// `config_file`, when given, is where the updated output directory history
/// is persisted.
pub fn generate_with(
    pipeline: &Pipeline,
    config: &mut SiteConfig,
    config_file: Option<&Path>,
    output_root: &Path,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateReport, GenerateError> {
    let emit = |event: GenerateEvent| {
        if let Some(tx) = &events {
            // A closed receiver only means nobody is listening
            let _ = tx.send(event);
        }
    };

    let recorded = config.record_output_dir();
    let rules = exclusion_rules(pipeline.vault, config)?;
    if recorded && let Some(path) = config_file {
        config::save_config_file(config, path)?;
        info!(output_dir = %config.output_dir, "recorded output directory in history");
    }

    fs::create_dir_all(output_root).map_err(|source| GenerateError::OutputDir {
        path: output_root.to_path_buf(),
        source,
    })?;

    let vault = pipeline.vault;
    let snapshot = vault.snapshot()?;
    let nav = build_nav_tree(&snapshot, &rules);

    let appearance = load_appearance(vault, &config.config_dir);
    export_styles(vault, config, &appearance, pipeline.fonts, output_root)
        .map_err(GenerateError::Styles)?;

    let (documents, assets) = partition_files(&snapshot, &rules);
    info!(
        documents = documents.len(),
        assets = assets.len(),
        output = %output_root.display(),
        "generating site"
    );
    emit(GenerateEvent::Started {
        documents: documents.len(),
        assets: assets.len(),
    });

    let mut report = GenerateReport {
        output_root: output_root.to_path_buf(),
        ..GenerateReport::default()
    };
    let fail = |path: &str, error: ItemError, report: &mut GenerateReport| {
        warn!(path, error = %error, "skipping item");
        let error = error.to_string();
        emit(GenerateEvent::ItemFailed {
            path: path.to_string(),
            error: error.clone(),
        });
        report.failures.push(ItemFailure {
            path: path.to_string(),
            error,
        });
    };

    for asset in &assets {
        match copy_asset(vault, asset, output_root) {
            Ok(dest) => report.assets.push(dest),
            Err(e) => fail(&asset.path, e, &mut report),
        }
    }

    let resolver = VaultLinkResolver::new(&snapshot);
    let site_name = config
        .site_name
        .clone()
        .unwrap_or_else(|| vault.name().to_string());
    let ctx = PageContext {
        site_name: &site_name,
        nav: &nav,
        resolver: &resolver,
        body_class: appearance.body_class(),
    };

    let total = documents.len();
    for (i, doc) in documents.iter().enumerate() {
        match write_page(pipeline, doc, &ctx, output_root) {
            Ok(dest) => {
                debug!(source = %doc.path, page = %dest, "wrote page");
                report.pages.push(dest);
            }
            Err(e) => fail(&doc.path, e, &mut report),
        }
        let processed = i + 1;
        if processed % PROGRESS_INTERVAL == 0 {
            emit(GenerateEvent::Progress { processed, total });
        }
    }

    info!(
        pages = report.pages.len(),
        assets = report.assets.len(),
        failed = report.failures.len(),
        "site generation complete"
    );
    emit(GenerateEvent::Completed {
        pages: report.pages.len(),
        assets: report.assets.len(),
        failed: report.failures.len(),
    });
    Ok(report)
}

/// Exclusion rules with output folders expressed as vault paths.
fn exclusion_rules(
    vault: &dyn VaultSource,
    config: &SiteConfig,
) -> Result<ExclusionRules, ConfigError> {
    match vault.root_dir() {
        Some(root) => config.rules_in(root),
        None => Ok(config.rules()),
    }
}

/// Eligible documents and assets, in enumeration order.
///
/// Uses the same hidden-name and exclusion checks as the navigation tree, so
/// a file is written exactly when its folder chain is visible there.
pub fn partition_files<'a>(
    snapshot: &'a VaultSnapshot,
    rules: &ExclusionRules,
) -> (Vec<&'a DocumentNode>, Vec<&'a DocumentNode>) {
    snapshot
        .files()
        .filter(|f| !f.path.split('/').any(is_hidden_name))
        .filter(|f| !rules.is_excluded(&f.path))
        .partition(|f| f.kind == NodeKind::Document)
}

fn copy_asset(
    vault: &dyn VaultSource,
    asset: &DocumentNode,
    output_root: &Path,
) -> Result<String, ItemError> {
    let bytes = vault.read(&asset.path)?;
    let dest = output_path(&asset.path);
    write_output(output_root, &dest, &bytes)?;
    Ok(dest)
}

fn write_page(
    pipeline: &Pipeline,
    doc: &DocumentNode,
    ctx: &PageContext,
    output_root: &Path,
) -> Result<String, ItemError> {
    let markdown = pipeline.vault.read_to_string(&doc.path)?;
    let html = assemble_page(doc, &markdown, ctx, pipeline.renderer)?;
    let dest = output_path(&doc.path);
    write_output(output_root, &dest, html.as_bytes())?;
    Ok(dest)
}

fn write_output(output_root: &Path, rel: &str, contents: &[u8]) -> std::io::Result<()> {
    let dest = output_root.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, contents)
}

/// Navigation tree and publication counts without writing anything.
pub fn plan(
    vault: &dyn VaultSource,
    config: &SiteConfig,
) -> Result<(Vec<NavItem>, usize, usize), GenerateError> {
    let rules = exclusion_rules(vault, config)?;
    let snapshot = vault.snapshot()?;
    let nav = build_nav_tree(&snapshot, &rules);
    let (documents, assets) = partition_files(&snapshot, &rules);
    Ok((nav, documents.len(), assets.len()))
}

// ============================================================================
// Tests
// ============================================================================
