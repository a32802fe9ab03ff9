//! Page assembly.
//!
//! Turns one rendered document into a complete HTML page: sidebar with the
//! shared navigation tree, breadcrumbs, the document body with its internal
//! links rewritten, and the inline theme toggle script.
//!
//! ## Page Shape
//!
//! ```text
//! body
//! └── div.app-container
//!     ├── aside.sidebar
//!     │   ├── div.sidebar-content   (div.nav-header + nav list)
//!     │   └── div.nav-footer        (button.theme-toggle)
//!     └── main.content
//!         ├── div.breadcrumbs
//!         └── div.content-wrapper
//!             └── div.markdown-preview-view.markdown-rendered
//!                 ├── h1.note-title
//!                 └── rendered markdown
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Everything except the rendered markdown fragment is escaped automatically.
//! Assembly has no side effects; the orchestrator writes the result.

use crate::links::{LinkResolver, rewrite_internal_links};
use crate::paths::{encode_href, output_path, relative_link};
use crate::render::{RenderError, Renderer};
use crate::styles::{CUSTOM_PATH, STYLE_PATH};
use crate::types::{DocumentNode, NavItem, strip_document_extension};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const THEME_JS: &str = include_str!("../static/theme.js");

const SUN_ICON: &str = r#"<svg class="icon-sun" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="5"/><path d="M12 1v2"/><path d="M12 21v2"/><path d="M4.22 4.22l1.42 1.42"/><path d="M18.36 18.36l1.42 1.42"/><path d="M1 12h2"/><path d="M21 12h2"/><path d="M4.22 19.78l1.42-1.42"/><path d="M18.36 5.64l1.42-1.42"/></svg>"#;
const MOON_ICON: &str = r#"<svg class="icon-moon" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M12 3a6 6 0 0 0 9 9 9 9 0 1 1-9-9Z"/></svg>"#;

/// Everything a page needs that is shared across the run.
pub struct PageContext<'a> {
    /// Sidebar header text.
    pub site_name: &'a str,
    pub nav: &'a [NavItem],
    pub resolver: &'a dyn LinkResolver,
    /// Initial `<body>` class (`theme-dark` / `theme-light`), if known.
    pub body_class: Option<&'a str>,
}

/// Render a document and wrap it in the site template.
pub fn assemble_page(
    doc: &DocumentNode,
    markdown: &str,
    ctx: &PageContext,
    renderer: &dyn Renderer,
) -> Result<String, RenderError> {
    let fragment = renderer.render(markdown, &doc.path)?;
    let body = rewrite_internal_links(&fragment, &doc.path, ctx.resolver);
    let title = doc.display_name();

    let content = html! {
        div.app-container {
            (sidebar(ctx.site_name, ctx.nav, &doc.path))
            main.content {
                (render_breadcrumbs(&doc.path))
                div.content-wrapper {
                    div.markdown-preview-view.markdown-rendered {
                        h1.note-title { (title) }
                        (PreEscaped(body))
                    }
                }
            }
        }
    };

    Ok(base_document(title, &doc.path, ctx.body_class, content).into_string())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, source_path: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(relative_link(source_path, STYLE_PATH));
                link rel="stylesheet" href=(relative_link(source_path, CUSTOM_PATH));
            }
            body class=[body_class] {
                (content)
                script { (PreEscaped(THEME_JS)) }
            }
        }
    }
}

fn sidebar(site_name: &str, nav: &[NavItem], current_path: &str) -> Markup {
    html! {
        aside.sidebar {
            div.sidebar-content {
                div.nav-header { (site_name) }
                (render_nav(nav, current_path))
            }
            div.nav-footer {
                button.theme-toggle onclick="toggleTheme()" title="Toggle Theme" {
                    (PreEscaped(SUN_ICON))
                    (PreEscaped(MOON_ICON))
                }
            }
        }
    }
}

/// Renders the navigation list as seen from `current_path`.
///
/// Folders are always expanded; the current document's link is marked `active`.
pub fn render_nav(items: &[NavItem], current_path: &str) -> Markup {
    html! {
        ul {
            @for item in items {
                li {
                    @if item.is_folder {
                        details open {
                            summary { (item.name) }
                            (render_nav(&item.children, current_path))
                        }
                    } @else {
                        @let href = encode_href(&relative_link(current_path, &output_path(&item.path)));
                        @let is_current = item.path == current_path;
                        a href=(href) class=[is_current.then_some("active")] { (item.name) }
                    }
                }
            }
        }
    }
}

/// One crumb per folder, then the active document name. Crumbs are not links.
pub fn render_breadcrumbs(source_path: &str) -> Markup {
    let mut segments: Vec<&str> = source_path.split('/').collect();
    let file = segments.pop().unwrap_or_default();

    html! {
        div.breadcrumbs {
            @for folder in &segments {
                span.breadcrumb-item { (folder) }
                span.breadcrumb-separator { " / " }
            }
            span.breadcrumb-item.active { (strip_document_extension(file)) }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::VaultLinkResolver;
    use crate::render::MarkdownRenderer;
    use crate::test_helpers::FailingRenderer;
    use crate::vault::VaultSnapshot;

    fn doc(name: &str) -> NavItem {
        NavItem {
            name: strip_document_extension(name.rsplit('/').next().unwrap()).to_string(),
            path: name.to_string(),
            is_folder: false,
            children: vec![],
        }
    }

    fn folder(name: &str, children: Vec<NavItem>) -> NavItem {
        NavItem {
            name: name.rsplit('/').next().unwrap().to_string(),
            path: name.to_string(),
            is_folder: true,
            children,
        }
    }

    fn sample_nav() -> Vec<NavItem> {
        vec![
            folder("notes", vec![doc("notes/a.md"), doc("notes/b.md")]),
            doc("index.md"),
        ]
    }

    fn assemble(path: &str, markdown: &str, files: &[&str]) -> String {
        let resolver = VaultLinkResolver::new(&VaultSnapshot::from_files(files));
        let nav = sample_nav();
        let ctx = PageContext {
            site_name: "My Vault",
            nav: &nav,
            resolver: &resolver,
            body_class: None,
        };
        assemble_page(
            &DocumentNode::file(path),
            markdown,
            &ctx,
            &MarkdownRenderer::new(),
        )
        .unwrap()
    }

    #[test]
    fn nav_renders_folders_as_open_details() {
        let html = render_nav(&sample_nav(), "index.md").into_string();
        assert!(html.starts_with("<ul><li><details open><summary>notes</summary><ul>"));
        assert!(html.contains(r#"<a href="notes/a.html">a</a>"#));
    }

    #[test]
    fn nav_links_are_relative_to_current_page() {
        let html = render_nav(&sample_nav(), "notes/a.md").into_string();
        assert!(html.contains(r#"<a href="b.html">b</a>"#));
        assert!(html.contains(r#"<a href="../index.html">index</a>"#));
    }

    #[test]
    fn nav_hrefs_encode_url_delimiters() {
        let nav = vec![folder(
            "C# notes",
            vec![doc("C# notes/why?.md"), doc("C# notes/100%.md")],
        )];
        let html = render_nav(&nav, "index.md").into_string();
        assert!(html.contains(r#"<a href="C%23%20notes/why%3F.html">why?</a>"#));
        assert!(html.contains(r#"<a href="C%23%20notes/100%25.html">100%</a>"#));
        assert!(html.contains("<summary>C# notes</summary>"));
    }

    #[test]
    fn nav_marks_current_item() {
        let html = render_nav(&sample_nav(), "notes/b.md").into_string();
        assert!(html.contains(r#"<a href="b.html" class="active">b</a>"#));
        assert_eq!(html.matches("active").count(), 1);
    }

    #[test]
    fn nav_renders_empty_folder() {
        let nav = vec![folder("drafts", vec![])];
        let html = render_nav(&nav, "index.md").into_string();
        assert!(html.contains("<details open><summary>drafts</summary><ul></ul></details>"));
    }

    #[test]
    fn breadcrumbs_for_nested_document() {
        let html = render_breadcrumbs("a/b/Note.md").into_string();
        assert_eq!(
            html,
            concat!(
                r#"<div class="breadcrumbs">"#,
                r#"<span class="breadcrumb-item">a</span><span class="breadcrumb-separator"> / </span>"#,
                r#"<span class="breadcrumb-item">b</span><span class="breadcrumb-separator"> / </span>"#,
                r#"<span class="breadcrumb-item active">Note</span>"#,
                "</div>"
            )
        );
    }

    #[test]
    fn breadcrumbs_for_root_document() {
        let html = render_breadcrumbs("index.md").into_string();
        assert!(!html.contains("breadcrumb-separator"));
        assert!(html.contains(r#"<span class="breadcrumb-item active">index</span>"#));
    }

    #[test]
    fn base_document_includes_doctype() {
        let doc = base_document("Test", "index.md", None, html! { p { "test" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Test</title>"));
    }

    #[test]
    fn stylesheet_links_are_relative() {
        let doc = base_document("T", "notes/deep/x.md", None, html! {}).into_string();
        assert!(doc.contains(r#"<link rel="stylesheet" href="../../assets/style.css">"#));
        assert!(doc.contains(r#"<link rel="stylesheet" href="../../assets/custom.css">"#));
    }

    #[test]
    fn base_document_applies_body_class() {
        let doc = base_document("T", "a.md", Some("theme-dark"), html! {}).into_string();
        assert!(doc.contains(r#"<body class="theme-dark">"#));
    }

    #[test]
    fn theme_script_persists_choice_and_follows_system() {
        let doc = base_document("T", "a.md", None, html! {}).into_string();
        assert!(doc.contains("function toggleTheme()"));
        assert!(doc.contains("localStorage.setItem('theme'"));
        assert!(doc.contains("prefers-color-scheme: dark"));
    }

    #[test]
    fn assembled_page_structure() {
        let html = assemble("notes/a.md", "Hello **world**", &["notes/a.md"]);
        assert!(html.contains("<title>a</title>"));
        assert!(html.contains(r#"<div class="nav-header">My Vault</div>"#));
        assert!(html.contains(r#"<button class="theme-toggle" onclick="toggleTheme()""#));
        assert!(html.contains(r#"<h1 class="note-title">a</h1>"#));
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.contains(r#"class="markdown-preview-view markdown-rendered""#));
    }

    #[test]
    fn internal_links_rewritten_against_page() {
        let html = assemble(
            "notes/a.md",
            "See [[b]] and [[index#Intro]].",
            &["notes/a.md", "notes/b.md", "index.md"],
        );
        assert!(html.contains(r#"data-href="b" href="b.html""#));
        assert!(html.contains(r#"data-href="index#Intro" href="../index.html#Intro""#));
    }

    #[test]
    fn broken_link_keeps_original_href() {
        let html = assemble("a.md", "[[Nowhere]]", &["a.md"]);
        assert!(html.contains(r#"data-href="Nowhere" href="Nowhere""#));
    }

    #[test]
    fn render_failure_propagates() {
        let resolver = VaultLinkResolver::default();
        let ctx = PageContext {
            site_name: "V",
            nav: &[],
            resolver: &resolver,
            body_class: None,
        };
        let result = assemble_page(
            &DocumentNode::file("bad.md"),
            "x",
            &ctx,
            &FailingRenderer::new(&["bad.md"]),
        );
        assert!(matches!(result, Err(RenderError::Failed { .. })));
    }

    #[test]
    fn html_escape_in_maud() {
        let items = vec![NavItem {
            name: "<script>alert('xss')</script>".to_string(),
            path: "x.md".to_string(),
            is_folder: false,
            children: vec![],
        }];
        let html = render_nav(&items, "index.md").into_string();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
