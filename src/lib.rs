//! # Vault Site
//!
//! Publishes a vault (a folder of linked markdown notes) as a static HTML
//! site: one page per note, a folder-tree sidebar shared by every page,
//! breadcrumbs, working internal links, and a stylesheet exported from the
//! vault's appearance settings.
//!
//! # Architecture: One Snapshot, One Pass
//!
//! ```text
//! vault/  →  VaultSnapshot  →  navigation tree  ┐
//!                           →  documents ───────┼→  dist/*.html
//!                           →  assets ──────────┘   dist/**  (verbatim)
//! appearance.json, themes, snippets            →   dist/assets/*.css
//! ```
//!
//! The vault is read once into an immutable [`vault::VaultSnapshot`]. The
//! sidebar, the set of written files and link resolution are all derived
//! from that value, and the same [`exclusion::ExclusionRules`] decide what
//! is published in the sidebar and on disk, so the two always agree.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`vault`] | `VaultSource` trait, on-disk vault, per-run snapshot |
//! | [`exclusion`] | The single publication predicate (output dirs, locked folders) |
//! | [`navigation`] | Sorted sidebar tree built from the snapshot |
//! | [`paths`] | Output path mapping and relative link computation |
//! | [`render`] | `Renderer` trait and the pulldown-cmark implementation with wikilinks |
//! | [`links`] | Internal link resolution and rewriting in rendered HTML |
//! | [`page`] | Full page assembly with Maud |
//! | [`styles`] | Appearance settings, stylesheet bundle, web font probe |
//! | [`generate`] | The build run: ordering, per-item isolation, progress events |
//! | [`config`] | `.vault-site.toml` loading, validation and persistence |
//! | [`types`] | Shared node and navigation types |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Full Rebuilds
//!
//! Every build rewrites every page. Navigation appears on every page, so a
//! single added note changes all of them; tracking that is not worth it for
//! vault-sized inputs.
//!
//! ## Relative Links Everywhere
//!
//! Stylesheets, sidebar entries and rewritten note links are all relative to
//! the page that contains them, so the output works from `file://` and from
//! any sub-path of a web server without configuration.
//!
//! ## Private Folders
//!
//! Locked folders only take effect while `allow_private_folders` is on. Output
//! folders (current and past) are excluded unconditionally, so toggling
//! privacy can never make the generator republish its own output.

pub mod config;
pub mod exclusion;
pub mod generate;
pub mod links;
pub mod navigation;
pub mod output;
pub mod page;
pub mod paths;
pub mod render;
pub mod styles;
pub mod types;
pub mod vault;

#[cfg(test)]
pub(crate) mod test_helpers;
