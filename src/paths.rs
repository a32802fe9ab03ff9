//! Output-space paths and relative links.
//!
//! Source documents live in vault space (`notes/a.md`), pages in output space
//! (`notes/a.html`). [`output_path`] maps one to the other; [`relative_link`]
//! computes the href a page needs to reach any other output file. Links are
//! always `/`-separated, whatever the host OS uses. [`encode_href`] turns such
//! a link into something safe to put in an `href` or `src`, since vault file
//! names may contain `#`, `?` or `%`.

use crate::types::{DOCUMENT_EXTENSION, is_document_path};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Bytes that would end or corrupt a URL path segment if left literal.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Output location of a vault file: documents get `.html`, assets keep their path.
pub fn output_path(source: &str) -> String {
    if is_document_path(source) {
        let stem = &source[..source.len() - DOCUMENT_EXTENSION.len() - 1];
        format!("{stem}.html")
    } else {
        source.to_string()
    }
}

/// Relative href from the page generated for `from_document` to `to_output`.
///
/// `to_output` must already be an output-space path. The base is the folder
/// containing `from_document`; its own file name does not count.
///
/// ```
/// use vault_site::paths::relative_link;
///
/// assert_eq!(relative_link("a/b/Note.md", "a/c/Other.html"), "../c/Other.html");
/// assert_eq!(relative_link("Note.md", "sub/Page.html"), "sub/Page.html");
/// ```
pub fn relative_link(from_document: &str, to_output: &str) -> String {
    let from_segs: Vec<&str> = from_document.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to_output.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = match from_segs.split_last() {
        Some((_, dir)) => dir,
        None => &from_segs[..],
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = "../".repeat(from_dir.len() - common);
    let rest = to_segs[common..].join("/");

    let link = format!("{ups}{rest}");
    if link.is_empty() {
        "./".to_string()
    } else {
        link
    }
}

/// Percent-encode each segment of a relative link, keeping the `/` separators.
///
/// ```
/// use vault_site::paths::encode_href;
///
/// assert_eq!(encode_href("../C# notes/100%?.html"), "../C%23%20notes/100%25%3F.html");
/// ```
pub fn encode_href(link: &str) -> String {
    link.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve `.` and `..` segments of a slash-separated path.
///
/// Returns `None` when `..` would climb above the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            s => out.push(s),
        }
    }
    Some(out.join("/"))
}
