//! Internal link resolution and rewriting.
//!
//! The renderer leaves every vault reference as written by the author
//! (`[[Other Note]]`, `../img/cat.png`). After rendering, each page's links are
//! resolved against the vault and rewritten to relative hrefs in output space.
//!
//! ## Resolution Order
//!
//! [`VaultLinkResolver`] tries, after dropping any `#fragment` and
//! percent-decoding:
//!
//! 1. the exact vault path (also with `.md` appended)
//! 2. the path relative to the linking document's folder (same, `..` allowed)
//! 3. a case-insensitive file-name or path-suffix match, if exactly one file matches
//!
//! Anything else is unresolved, and an unresolved link keeps its original
//! href. Broken links are not errors.

use crate::paths::{encode_href, normalize, output_path, relative_link};
use crate::render::{escape_html, unescape_html};
use crate::types::{DOCUMENT_EXTENSION, is_document_path};
use crate::vault::{VaultSnapshot, parent_path};
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(a|img)\s[^>]*>").unwrap());
static ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)="([^"]*)""#).unwrap());

/// Maps a raw link token to the vault file it names.
pub trait LinkResolver {
    /// Vault path of the target of `link` as written in `source_path`.
    fn resolve(&self, link: &str, source_path: &str) -> Option<String>;
}

/// Resolver over every file in a snapshot.
#[derive(Debug, Clone, Default)]
pub struct VaultLinkResolver {
    files: BTreeSet<String>,
    by_name: HashMap<String, Vec<String>>,
}

impl VaultLinkResolver {
    pub fn new(snapshot: &VaultSnapshot) -> Self {
        let mut resolver = Self::default();
        for file in snapshot.files() {
            resolver.files.insert(file.path.clone());
            resolver
                .by_name
                .entry(file.name.to_lowercase())
                .or_default()
                .push(file.path.clone());
        }
        resolver
    }

    fn exact(&self, candidate: &str) -> Option<String> {
        normalize(candidate).filter(|p| self.files.contains(p))
    }

    /// `Some(Some(path))` for a unique match, `Some(None)` when ambiguous.
    fn by_suffix(&self, candidate: &str) -> Option<Option<String>> {
        let wanted = candidate.trim_start_matches("./").to_lowercase();
        let name = wanted.rsplit('/').next().unwrap_or(&wanted);
        let paths = self.by_name.get(name)?;

        let suffix = format!("/{wanted}");
        let matches: Vec<&String> = paths
            .iter()
            .filter(|p| {
                let lower = p.to_lowercase();
                lower == wanted || lower.ends_with(&suffix)
            })
            .collect();

        match matches.as_slice() {
            [] => None,
            [only] => Some(Some((*only).clone())),
            _ => Some(None),
        }
    }
}

fn candidates(link: &str) -> Vec<String> {
    if is_document_path(link) {
        vec![link.to_string()]
    } else {
        vec![link.to_string(), format!("{link}.{DOCUMENT_EXTENSION}")]
    }
}

impl LinkResolver for VaultLinkResolver {
    fn resolve(&self, link: &str, source_path: &str) -> Option<String> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        let candidates = candidates(link);

        if let Some(found) = candidates.iter().find_map(|c| self.exact(c)) {
            return Some(found);
        }

        let base = parent_path(source_path);
        if !base.is_empty()
            && let Some(found) = candidates
                .iter()
                .find_map(|c| self.exact(&format!("{base}/{c}")))
        {
            return Some(found);
        }

        for candidate in &candidates {
            if let Some(result) = self.by_suffix(candidate) {
                return result;
            }
        }
        None
    }
}

/// Output-space href for a raw link token, or `None` if it does not resolve.
///
/// The `#fragment`, if any, is carried over. Both parts come back percent-encoded.
pub fn resolve_href(token: &str, source_path: &str, resolver: &dyn LinkResolver) -> Option<String> {
    let (path, fragment) = match token.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (token, None),
    };
    if path.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());
    let target = resolver
        .resolve(&decoded, source_path)
        .or_else(|| (decoded != path).then(|| resolver.resolve(path, source_path)).flatten())?;

    let href = encode_href(&relative_link(source_path, &output_path(&target)));
    Some(match fragment {
        Some(fragment) => format!("{href}#{}", encode_href(fragment)),
        None => href,
    })
}

/// Rewrite every marked internal link and embed in a rendered fragment.
pub fn rewrite_internal_links(
    html: &str,
    source_path: &str,
    resolver: &dyn LinkResolver,
) -> String {
    TAG.replace_all(html, |caps: &Captures| {
        rewrite_tag(&caps[0], &caps[1], source_path, resolver)
    })
    .into_owned()
}

fn rewrite_tag(tag: &str, element: &str, source_path: &str, resolver: &dyn LinkResolver) -> String {
    let (marker, token_attr, target_attr) = match element {
        "a" => ("internal-link", "data-href", "href"),
        _ => ("internal-embed", "data-src", "src"),
    };

    let attrs: Vec<Captures> = ATTR.captures_iter(tag).collect();
    let attr = |name: &str| {
        attrs
            .iter()
            .find(|c| &c[1] == name)
            .and_then(|c| c.get(2))
    };

    let is_marked = attr("class")
        .is_some_and(|class| class.as_str().split_whitespace().any(|c| c == marker));
    if !is_marked {
        return tag.to_string();
    }

    let Some(token) = attr(token_attr).or_else(|| attr(target_attr)) else {
        return tag.to_string();
    };
    let Some(href) = resolve_href(&unescape_html(token.as_str()), source_path, resolver) else {
        return tag.to_string();
    };

    match attr(target_attr) {
        Some(value) => format!(
            "{}{}{}",
            &tag[..value.start()],
            escape_html(&href),
            &tag[value.end()..]
        ),
        None => {
            let close = if tag.ends_with("/>") { tag.len() - 2 } else { tag.len() - 1 };
            format!(
                r#"{} {target_attr}="{}"{}"#,
                tag[..close].trim_end(),
                escape_html(&href),
                &tag[close..]
            )
        }
    }
}
