/// Inline transformations applied to every piece of body text.
///
/// The passes run in a fixed order, each one a plain rewrite of the string
/// produced by the previous one: escape, footnotes, code spans, bold,
/// italic, links.
use crate::footnotes::{self, Footnotes};
use crate::renderer::escape_html;
use regex::Regex;
use std::sync::LazyLock;

static CODE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

static BOLD_STAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

static BOLD_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^\)]+)\)").unwrap());

/// Full inline pipeline: escape, extract footnotes into `notes`, then
/// styles and links.
pub fn transform(text: &str, notes: &mut Footnotes) -> String {
    let escaped = escape_html(text);
    let extracted = footnotes::extract(&escaped, notes);
    apply_styles_and_links(&extracted)
}

/// Styles followed by links, with no escaping and no footnote extraction.
/// Used for footnote bodies and image attributions.
pub fn apply_styles_and_links(text: &str) -> String {
    convert_links(&apply_styles(text))
}

/// Code spans, then bold, then italic.
pub fn apply_styles(text: &str) -> String {
    let text = CODE_SPAN_RE.replace_all(text, "<code>${1}</code>");
    let text = BOLD_STAR_RE.replace_all(&text, "<strong>${1}</strong>");
    let text = BOLD_UNDERSCORE_RE.replace_all(&text, "<strong>${1}</strong>");
    let text = convert_italic(&text, b'*');
    convert_italic(&text, b'_')
}

/// `[text](url)` to an anchor.
pub fn convert_links(text: &str) -> String {
    LINK_RE
        .replace_all(text, "<a href=\"${2}\">${1}</a>")
        .into_owned()
}

/// Wrap single-delimiter spans in `<em>`.
///
/// A delimiter only counts when neither neighbour is the same delimiter, so
/// a leftover `**` is never read as two italic markers. The span is the
/// shortest non-empty run up to the next qualifying delimiter and may not
/// cross a newline. Matches do not overlap and are taken left to right.
fn convert_italic(text: &str, delim: u8) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let opens = bytes[i] == delim
            && (i == 0 || bytes[i - 1] != delim)
            && bytes.get(i + 1) != Some(&delim);
        if opens && let Some(close) = find_italic_close(bytes, i + 1, delim) {
            out.push_str(&text[copied..i]);
            out.push_str("<em>");
            out.push_str(&text[i + 1..close]);
            out.push_str("</em>");
            copied = close + 1;
            i = close + 1;
            continue;
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

fn find_italic_close(bytes: &[u8], from: usize, delim: u8) -> Option<usize> {
    // The span needs at least one character before a closer can appear.
    if from >= bytes.len() || bytes[from] == b'\n' {
        return None;
    }
    let mut j = from + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b if b == delim && bytes[j - 1] != delim && bytes.get(j + 1) != Some(&delim) => {
                return Some(j);
            }
            _ => {}
        }
        j += 1;
    }
    None
}
