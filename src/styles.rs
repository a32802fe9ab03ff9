//! Stylesheet export.
//!
//! Every site gets two stylesheets under `assets/`:
//!
//! - `style.css`: the built-in base theme, then the vault's active community
//!   theme, its enabled CSS snippets and any extra configured stylesheets,
//!   concatenated verbatim in that order.
//! - `custom.css`: generated overrides (accent colour, font family, optional
//!   web-font import) followed by the fixed page layout rules.
//!
//! Everything here is best-effort. A missing or malformed `appearance.json`,
//! an unreadable snippet, or an unreachable font server only produces a
//! warning, and the site falls back to the default look.

use crate::config::SiteConfig;
use crate::vault::VaultSource;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use ureq::Agent;

/// Output-relative location of the bundled stylesheet.
pub const STYLE_PATH: &str = "assets/style.css";
/// Output-relative location of the generated overrides.
pub const CUSTOM_PATH: &str = "assets/custom.css";

const BASE_CSS: &str = include_str!("../static/base.css");
const LAYOUT_CSS: &str = include_str!("../static/layout.css");

const SIDEBAR_WIDTH: &str = "256px";

/// The subset of `appearance.json` the site cares about.
///
/// Unknown keys are ignored; the file belongs to the editor, not to us.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Appearance {
    pub accent_color: Option<String>,
    pub text_font_family: Option<String>,
    pub interface_font_family: Option<String>,
    /// Active community theme name.
    pub css_theme: Option<String>,
    /// Base theme: `obsidian` (dark) or `moonstone` (light).
    pub theme: Option<String>,
    pub enabled_css_snippets: Vec<String>,
}

impl Appearance {
    /// Text font, falling back to the interface font.
    pub fn font(&self) -> Option<&str> {
        non_blank(&self.text_font_family).or_else(|| non_blank(&self.interface_font_family))
    }

    pub fn accent(&self) -> Option<&str> {
        non_blank(&self.accent_color)
    }

    /// Initial body class matching the editor's base theme.
    pub fn body_class(&self) -> Option<&'static str> {
        match non_blank(&self.theme)? {
            "obsidian" => Some("theme-dark"),
            "moonstone" => Some("theme-light"),
            _ => None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Read `<config_dir>/appearance.json`, or defaults if that fails.
pub fn load_appearance(vault: &dyn VaultSource, config_dir: &str) -> Appearance {
    let path = format!("{config_dir}/appearance.json");
    if !vault.exists(&path) {
        debug!(path = %path, "no appearance settings, using defaults");
        return Appearance::default();
    }
    let text = match vault.read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path, error = %e, "could not read appearance settings");
            return Appearance::default();
        }
    };
    match serde_json::from_str(&text) {
        Ok(appearance) => appearance,
        Err(e) => {
            warn!(path = %path, error = %e, "malformed appearance settings");
            Appearance::default()
        }
    }
}

// =============================================================================
// Web fonts
// =============================================================================

/// Checks whether a remote font stylesheet can be imported.
pub trait FontProbe {
    fn is_available(&self, url: &str) -> bool;
}

/// Probes with an HTTP `HEAD` request.
pub struct WebFontProbe {
    agent: Agent,
}

impl WebFontProbe {
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for WebFontProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl FontProbe for WebFontProbe {
    fn is_available(&self, url: &str) -> bool {
        match self.agent.head(url).call() {
            Ok(_) => true,
            Err(e) => {
                warn!(url, error = %e, "web font not available, using default fonts");
                false
            }
        }
    }
}

/// Never confirms a font. Used for offline builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFontProbe;

impl FontProbe for NoFontProbe {
    fn is_available(&self, _url: &str) -> bool {
        false
    }
}

/// Google Fonts stylesheet URL for a family name.
pub fn google_font_url(font: &str) -> String {
    format!(
        "https://fonts.googleapis.com/css2?family={}:wght@400;500;600;700&display=swap",
        font.trim().replace(' ', "+")
    )
}

// =============================================================================
// Stylesheets
// =============================================================================

/// Vault paths of the stylesheets layered on top of the base theme.
///
/// Legacy single-file themes (`themes/<name>.css`) are tried after the
/// folder layout.
pub fn stylesheet_sources(
    vault: &dyn VaultSource,
    config: &SiteConfig,
    appearance: &Appearance,
) -> Vec<String> {
    let dir = &config.config_dir;
    let mut sources = Vec::new();

    if let Some(theme) = non_blank(&appearance.css_theme) {
        let folder_theme = format!("{dir}/themes/{theme}/theme.css");
        let legacy_theme = format!("{dir}/themes/{theme}.css");
        if !vault.exists(&folder_theme) && vault.exists(&legacy_theme) {
            sources.push(legacy_theme);
        } else {
            sources.push(folder_theme);
        }
    }
    for snippet in &appearance.enabled_css_snippets {
        sources.push(format!("{dir}/snippets/{snippet}.css"));
    }
    sources.extend(config.stylesheets.iter().cloned());
    sources
}

/// Contents of `style.css`. Unreadable sources are skipped.
pub fn build_style_bundle(
    vault: &dyn VaultSource,
    config: &SiteConfig,
    appearance: &Appearance,
) -> String {
    let mut css = String::from(BASE_CSS);
    for source in stylesheet_sources(vault, config, appearance) {
        match vault.read_to_string(&source) {
            Ok(text) => {
                css.push_str(&format!("\n/* {source} */\n"));
                css.push_str(&text);
                if !text.ends_with('\n') {
                    css.push('\n');
                }
            }
            Err(e) => warn!(stylesheet = %source, error = %e, "skipping stylesheet"),
        }
    }
    css
}

/// Values interpolated into CSS must not be able to close the declaration.
fn css_value(value: Option<&str>, what: &str) -> Option<String> {
    let value = value?;
    if value.contains([';', '{', '}', '<', '>', '\'', '"', '\\']) {
        warn!(value, "ignoring unsafe {what} from appearance settings");
        return None;
    }
    Some(value.to_string())
}

/// Contents of `custom.css`.
///
/// `font_import` is the stylesheet URL to `@import`, when the probe confirmed it.
pub fn custom_css(accent: Option<&str>, font: Option<&str>, font_import: Option<&str>) -> String {
    let import = font_import
        .map(|url| format!("@import url('{url}');\n"))
        .unwrap_or_default();

    let mut overrides = String::new();
    if let Some(font) = font {
        overrides.push_str(&format!(
            "    --font-interface: '{font}', sans-serif !important;\n    --font-text: '{font}', sans-serif !important;\n"
        ));
    }
    if let Some(accent) = accent {
        for var in [
            "--interactive-accent",
            "--text-accent",
            "--link-color",
            "--link-color-hover",
            "--link-external-color-hover",
        ] {
            overrides.push_str(&format!("    {var}: {accent} !important;\n"));
        }
    }

    format!(
        r#"/* Custom & Overrides CSS */
{import}
:root, body {{
    --sidebar-width: {sidebar_width};
{overrides}}}

{layout}"#,
        import = import,
        sidebar_width = SIDEBAR_WIDTH,
        overrides = overrides,
        layout = LAYOUT_CSS,
    )
}

/// Write `assets/style.css` and `assets/custom.css` under `output_root`.
pub fn export_styles(
    vault: &dyn VaultSource,
    config: &SiteConfig,
    appearance: &Appearance,
    fonts: &dyn FontProbe,
    output_root: &Path,
) -> std::io::Result<()> {
    fs::create_dir_all(output_root.join("assets"))?;

    let bundle = build_style_bundle(vault, config, appearance);
    fs::write(output_root.join(STYLE_PATH), bundle)?;

    let font = css_value(appearance.font(), "font family");
    let accent = css_value(appearance.accent(), "accent colour");
    let font_url = font.as_deref().map(google_font_url);
    let import = match &font_url {
        Some(url) if config.web_fonts && fonts.is_available(url) => Some(url.as_str()),
        _ => None,
    };

    let custom = custom_css(accent.as_deref(), font.as_deref(), import);
    fs::write(output_root.join(CUSTOM_PATH), custom)?;
    Ok(())
}
