//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary display for every entry is what a reader of the site sees:
//! its position among its siblings and its display name. Vault and output
//! paths are secondary context, shown after an arrow or on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Navigation
//! 001 notes/
//!     001 Alpha → notes/Alpha.html
//!     002 Beta → notes/Beta.html
//! 002 index → index.html
//!
//! Publishing 3 documents, 1 asset
//!     Output: dist
//!     Locked folders: private (excluded)
//! ```
//!
//! ## Build
//!
//! ```text
//! Building 3 documents, 1 asset
//!     10/25 documents
//! Failed: notes/broken.md
//!     error: read failed: Not valid UTF-8: notes/broken.md
//! Generated 24 pages, 1 asset (1 failed)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::SiteConfig;
use crate::generate::{GenerateEvent, GenerateReport};
use crate::paths::output_path;
use crate::types::{NavItem, strip_document_extension};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Format the sidebar tree with positional indices per sibling level.
///
/// Folders end with `/`; documents show their generated page.
pub fn format_nav_tree(nav: &[NavItem]) -> Vec<String> {
    let mut lines = Vec::new();
    walk_nav(nav, 0, &mut lines);
    lines
}

fn walk_nav(items: &[NavItem], depth: usize, lines: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let header = if item.is_folder {
            format!("{}{} {}/", indent(depth), format_index(i + 1), item.name)
        } else {
            format!(
                "{}{} {} \u{2192} {}",
                indent(depth),
                format_index(i + 1),
                strip_document_extension(&item.name),
                output_path(&item.path)
            )
        };
        lines.push(header);
        walk_nav(&item.children, depth + 1, lines);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format what a build would publish, without building.
pub fn format_check_output(
    nav: &[NavItem],
    documents: usize,
    assets: usize,
    config: &SiteConfig,
) -> Vec<String> {
    let mut lines = vec!["Navigation".to_string()];
    if nav.is_empty() {
        lines.push("    (empty)".to_string());
    } else {
        lines.extend(format_nav_tree(nav));
    }

    lines.push(String::new());
    lines.push(format!(
        "Publishing {}, {}",
        count(documents, "document"),
        count(assets, "asset")
    ));
    lines.push(format!("    Output: {}", config.output_dir));

    let history: Vec<&str> = config
        .previous_output_dirs
        .iter()
        .map(String::as_str)
        .filter(|d| *d != config.output_dir)
        .collect();
    if !history.is_empty() {
        lines.push(format!("    Previous outputs: {}", history.join(", ")));
    }

    if !config.locked_folders.is_empty() {
        let state = if config.allow_private_folders {
            "excluded"
        } else {
            "published, privacy off"
        };
        lines.push(format!(
            "    Locked folders: {} ({state})",
            config.locked_folders.join(", ")
        ));
    }
    lines
}

pub fn print_check_output(nav: &[NavItem], documents: usize, assets: usize, config: &SiteConfig) {
    for line in format_check_output(nav, documents, assets, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::Started { documents, assets } => vec![format!(
            "Building {}, {}",
            count(*documents, "document"),
            count(*assets, "asset")
        )],
        GenerateEvent::Progress { processed, total } => {
            vec![format!("    {processed}/{total} documents")]
        }
        GenerateEvent::ItemFailed { path, error } => {
            vec![format!("Failed: {path}"), format!("    error: {error}")]
        }
        GenerateEvent::Completed {
            pages,
            assets,
            failed,
        } => {
            let mut summary = format!(
                "Generated {}, {}",
                count(*pages, "page"),
                count(*assets, "asset")
            );
            if *failed > 0 {
                summary.push_str(&format!(" ({failed} failed)"));
            }
            vec![summary]
        }
    }
}

/// Format the final report: where the site went and what was skipped.
pub fn format_report(report: &GenerateReport) -> Vec<String> {
    let mut lines = vec![format!("Site written to {}", report.output_root.display())];
    if !report.failures.is_empty() {
        lines.push(format!("Skipped {}:", count(report.failures.len(), "item")));
        for failure in &report.failures {
            lines.push(format!("    {}", failure.path));
        }
    }
    lines
}

pub fn print_report(report: &GenerateReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ItemFailure;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn doc(path: &str) -> NavItem {
        NavItem {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            is_folder: false,
            children: vec![],
        }
    }

    fn folder(path: &str, children: Vec<NavItem>) -> NavItem {
        NavItem {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            is_folder: true,
            children,
        }
    }

    #[test]
    fn format_index_is_zero_padded() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(0, "page"), "0 pages");
        assert_eq!(count(1, "page"), "1 page");
        assert_eq!(count(2, "asset"), "2 assets");
    }

    #[test]
    fn nav_tree_indents_children_and_shows_pages() {
        let nav = vec![
            folder(
                "notes",
                vec![doc("notes/Alpha.md"), folder("notes/empty", vec![])],
            ),
            doc("index.md"),
        ];
        assert_eq!(
            format_nav_tree(&nav),
            vec![
                "001 notes/",
                "    001 Alpha \u{2192} notes/Alpha.html",
                "    002 empty/",
                "002 index \u{2192} index.html",
            ]
        );
    }

    #[test]
    fn check_output_lists_rules() {
        let config = SiteConfig {
            allow_private_folders: true,
            locked_folders: vec!["private".to_string()],
            previous_output_dirs: vec!["dist".to_string(), "old".to_string()],
            ..SiteConfig::default()
        };
        let lines = format_check_output(&[doc("a.md")], 1, 2, &config);
        assert_eq!(
            lines,
            vec![
                "Navigation",
                "001 a \u{2192} a.html",
                "",
                "Publishing 1 document, 2 assets",
                "    Output: dist",
                "    Previous outputs: old",
                "    Locked folders: private (excluded)",
            ]
        );
    }

    #[test]
    fn check_output_flags_locked_folders_published_without_privacy() {
        let config = SiteConfig {
            locked_folders: vec!["private".to_string()],
            ..SiteConfig::default()
        };
        let lines = format_check_output(&[], 0, 0, &config);
        assert_eq!(lines[1], "    (empty)");
        assert_eq!(
            lines.last().unwrap(),
            "    Locked folders: private (published, privacy off)"
        );
    }

    #[test]
    fn started_event() {
        let lines = format_event(&GenerateEvent::Started {
            documents: 3,
            assets: 1,
        });
        assert_eq!(lines, vec!["Building 3 documents, 1 asset"]);
    }

    #[test]
    fn progress_event() {
        let lines = format_event(&GenerateEvent::Progress {
            processed: 10,
            total: 25,
        });
        assert_eq!(lines, vec!["    10/25 documents"]);
    }

    #[test]
    fn failed_event_shows_error_as_context() {
        let lines = format_event(&GenerateEvent::ItemFailed {
            path: "notes/broken.md".to_string(),
            error: "boom".to_string(),
        });
        assert_eq!(lines, vec!["Failed: notes/broken.md", "    error: boom"]);
    }

    #[test]
    fn completed_event_mentions_failures_only_when_present() {
        let clean = format_event(&GenerateEvent::Completed {
            pages: 1,
            assets: 0,
            failed: 0,
        });
        assert_eq!(clean, vec!["Generated 1 page, 0 assets"]);

        let dirty = format_event(&GenerateEvent::Completed {
            pages: 24,
            assets: 1,
            failed: 1,
        });
        assert_eq!(dirty, vec!["Generated 24 pages, 1 asset (1 failed)"]);
    }

    #[test]
    fn report_lists_skipped_items() {
        let report = GenerateReport {
            output_root: PathBuf::from("/vault/dist"),
            pages: vec!["a.html".to_string()],
            assets: vec![],
            failures: vec![ItemFailure {
                path: "b.md".to_string(),
                error: "boom".to_string(),
            }],
        };
        assert_eq!(
            format_report(&report),
            vec!["Site written to /vault/dist", "Skipped 1 item:", "    b.md"]
        );
    }
}
