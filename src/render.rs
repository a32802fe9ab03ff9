//! Markdown rendering.
//!
//! The pipeline treats rendering as a black box behind [`Renderer`]: markdown
//! text in, HTML fragment out. The only contract is that links to other vault
//! files come back marked so the page assembler can find and rewrite them:
//!
//! - `<a class="internal-link" data-href="TOKEN" href="TOKEN">` for links
//! - `<img class="internal-embed" data-src="TOKEN" src="TOKEN">` for embedded images
//!
//! where `TOKEN` is the raw link text as written by the author.
//!
//! [`MarkdownRenderer`] is the bundled implementation on top of pulldown-cmark.
//! It understands `[[wikilinks]]`, `[[target|alias]]`, `[[target#heading]]`,
//! `![[image.png]]` embeds, plain `[text](relative/path.md)` links and
//! `![alt](relative/image.png)` images.
//! Wikilink syntax inside code is left alone. Embeds of anything that is not
//! an image render as ordinary internal links; transclusion is not supported.

use pulldown_cmark::{
    CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render {path}: {message}")]
    Failed { path: String, message: String },
}

/// Markdown → HTML fragment.
pub trait Renderer {
    fn render(&self, markdown: &str, source_path: &str) -> Result<String, RenderError>;
}

// (!)?                      embed marker (group 1)
// ([^\]\|#]+)               target (group 2)
// (?:#\^([a-zA-Z0-9_-]+))?  block reference (group 3)
// (?:#([^\]\|]+))?          heading (group 4)
// (?:\|([^\]]+))?           alias (group 5)
static WIKILINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\]\|#]+)(?:#\^([a-zA-Z0-9_-]+))?(?:#([^\]\|]+))?(?:\|([^\]]+))?\]\]")
        .unwrap()
});

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif"];

/// A relative markdown image whose alt text is still being collected.
struct PendingImage<'a> {
    dest: CowStr<'a>,
    title: CowStr<'a>,
    alt: String,
    nested: usize,
}

impl PendingImage<'_> {
    fn markup(&self) -> String {
        let src = escape_html(&self.dest);
        let alt = escape_html(&self.alt);
        if self.title.is_empty() {
            format!(r#"<img class="internal-embed" data-src="{src}" src="{src}" alt="{alt}">"#)
        } else {
            format!(
                r#"<img class="internal-embed" data-src="{src}" src="{src}" alt="{alt}" title="{}">"#,
                escape_html(&self.title)
            )
        }
    }
}

/// The bundled pulldown-cmark renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        Self { options }
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str, _source_path: &str) -> Result<String, RenderError> {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, self.options));

        let mut events: Vec<Event> = Vec::new();
        // Inside fenced/indented code or front matter, text is taken literally.
        let mut verbatim = false;
        let mut open_links: Vec<bool> = Vec::new();
        let mut image: Option<PendingImage> = None;

        for event in parser {
            // Alt text is plain text, so everything up to the image end is flattened.
            if let Some(pending) = &mut image {
                match event {
                    Event::Start(Tag::Image { .. }) => pending.nested += 1,
                    Event::End(TagEnd::Image) if pending.nested > 0 => pending.nested -= 1,
                    Event::End(TagEnd::Image) => {
                        events.push(Event::InlineHtml(pending.markup().into()));
                        image = None;
                    }
                    Event::Text(text) | Event::Code(text) => pending.alt.push_str(&text),
                    Event::SoftBreak | Event::HardBreak => pending.alt.push(' '),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(tag @ (Tag::CodeBlock(_) | Tag::MetadataBlock(_))) => {
                    verbatim = true;
                    events.push(Event::Start(tag));
                }
                Event::End(end @ (TagEnd::CodeBlock | TagEnd::MetadataBlock(_))) => {
                    verbatim = false;
                    events.push(Event::End(end));
                }
                Event::Text(text) if !verbatim => expand_wikilinks(&text, &mut events),
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    if is_internal_href(link_type, &dest_url) {
                        open_links.push(true);
                        events.push(Event::InlineHtml(
                            internal_anchor(&dest_url, Some(&*title)).into(),
                        ));
                    } else {
                        open_links.push(false);
                        events.push(Event::Start(Tag::Link {
                            link_type,
                            dest_url,
                            title,
                            id,
                        }));
                    }
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    ..
                }) if is_internal_href(link_type, &dest_url) => {
                    image = Some(PendingImage {
                        dest: dest_url,
                        title,
                        alt: String::new(),
                        nested: 0,
                    });
                }
                Event::End(TagEnd::Link) => {
                    if open_links.pop().unwrap_or(false) {
                        events.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                    } else {
                        events.push(Event::End(TagEnd::Link));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}

/// Split a text run into plain text and wikilink markup.
fn expand_wikilinks<'a>(text: &str, events: &mut Vec<Event<'a>>) {
    let mut last = 0;
    for cap in WIKILINK.captures_iter(text) {
        let Some(full) = cap.get(0) else { continue };
        if full.start() > last {
            events.push(Event::Text(text[last..full.start()].to_string().into()));
        }
        last = full.end();

        let embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let target = cap.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        let block = cap.get(3).map(|m| m.as_str());
        let heading = cap.get(4).map(|m| m.as_str().trim());
        let alias = cap.get(5).map(|m| m.as_str().trim());

        let token = match (block, heading) {
            (Some(b), _) => format!("{target}#^{b}"),
            (None, Some(h)) => format!("{target}#{h}"),
            (None, None) => target.to_string(),
        };

        let markup = if embed && is_image_target(target) {
            internal_embed(&token, alias)
        } else {
            let label = match (alias, heading) {
                (Some(a), _) => a.to_string(),
                (None, Some(h)) => format!("{target} > {h}"),
                (None, None) => target.to_string(),
            };
            format!("{}{}</a>", internal_anchor(&token, None), escape_html(&label))
        };
        events.push(Event::InlineHtml(markup.into()));
    }
    if last < text.len() {
        events.push(Event::Text(text[last..].to_string().into()));
    }
}

fn internal_anchor(token: &str, title: Option<&str>) -> String {
    let token = escape_html(token);
    match title.filter(|t| !t.is_empty()) {
        Some(t) => format!(
            r#"<a class="internal-link" data-href="{token}" href="{token}" title="{}">"#,
            escape_html(t)
        ),
        None => format!(r#"<a class="internal-link" data-href="{token}" href="{token}">"#),
    }
}

/// `![[image.png|300]]` sets a width; any other alias becomes the alt text.
fn internal_embed(token: &str, alias: Option<&str>) -> String {
    let src = escape_html(token);
    match alias {
        Some(a) if !a.is_empty() && a.chars().all(|c| c.is_ascii_digit()) => format!(
            r#"<img class="internal-embed" data-src="{src}" src="{src}" alt="{src}" width="{a}">"#
        ),
        Some(a) => format!(
            r#"<img class="internal-embed" data-src="{src}" src="{src}" alt="{}">"#,
            escape_html(a)
        ),
        None => format!(r#"<img class="internal-embed" data-src="{src}" src="{src}" alt="{src}">"#),
    }
}

fn is_image_target(target: &str) -> bool {
    target
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Links without a URL scheme that point somewhere other than this page or
/// the site root are treated as vault references.
fn is_internal_href(link_type: LinkType, dest: &str) -> bool {
    if matches!(link_type, LinkType::Autolink | LinkType::Email) {
        return false;
    }
    !dest.is_empty() && !dest.starts_with('#') && !dest.starts_with('/') && !has_url_scheme(dest)
}

/// `https://…`, `mailto:…`, `obsidian://…` and the like.
fn has_url_scheme(dest: &str) -> bool {
    let Some((scheme, _)) = dest.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Escape text for use in HTML content or a double-quoted attribute.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_html`] for the entities HTML writers emit in attributes.
pub(crate) fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
