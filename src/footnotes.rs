/// Inline footnote collection.
///
/// A footnote is written inline as `[^body]`. The body may contain balanced
/// `[...]` and `(...)` groups (so links work inside it), and a backslash
/// skips the character after it while looking for the closing bracket.
/// Each marker is numbered in order of appearance for the whole document and
/// replaced by a superscript reference; the bodies are emitted as a trailing
/// list once the document is finished.
use crate::inline;
use crate::renderer::{render_footnote_ref, render_footnote_section};
use std::ops::Range;

/// Ordered footnote bodies for one document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Footnotes {
    bodies: Vec<String>,
}

impl Footnotes {
    pub fn new() -> Self {
        Footnotes { bodies: Vec::new() }
    }

    /// Register a rendered body and return its id.
    pub fn push(&mut self, body: String) -> usize {
        self.bodies.push(body);
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[String] {
        &self.bodies
    }

    /// Trailing section fragments, or nothing when no footnote was collected.
    pub fn render(&self) -> Vec<String> {
        if self.is_empty() {
            Vec::new()
        } else {
            render_footnote_section(&self.bodies)
        }
    }
}

/// Location of a `[^...]` marker in a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// The whole marker, brackets included.
    pub span: Range<usize>,
    /// The text between `[^` and the closing `]`.
    pub body: Range<usize>,
}

/// Find all well-formed footnote markers, left to right.
///
/// A `[^` with no matching close is not a marker; scanning resumes right
/// after it so later markers on the same line are still found.
pub fn find_markers(text: &str) -> Vec<Marker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'[' || bytes[i + 1] != b'^' {
            i += 1;
            continue;
        }

        let start = i;
        let mut j = i + 2;
        let mut bracket_depth: isize = 0;
        let mut paren_depth: isize = 0;
        let mut close = None;

        while j < bytes.len() {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b'[' => bracket_depth += 1,
                b']' => {
                    if bracket_depth == 0 && paren_depth == 0 {
                        close = Some(j);
                        break;
                    }
                    bracket_depth -= 1;
                }
                b'(' => paren_depth += 1,
                b')' => paren_depth -= 1,
                _ => {}
            }
            j += 1;
        }

        match close {
            Some(end) => {
                markers.push(Marker {
                    span: start..end + 1,
                    body: start + 2..end,
                });
                i = end + 1;
            }
            None => i = start + 2,
        }
    }

    markers
}

/// Replace every footnote marker in `text` with a superscript reference and
/// register its body (with inline styles and links applied) in `notes`.
///
/// Ids are handed out left to right; the splices run right to left so the
/// byte offsets of earlier markers stay valid. Whitespace directly before a
/// marker is dropped so the reference hugs the preceding word.
pub fn extract(text: &str, notes: &mut Footnotes) -> String {
    let markers = find_markers(text);
    if markers.is_empty() {
        return text.to_string();
    }

    let ids: Vec<usize> = markers
        .iter()
        .map(|marker| {
            let body = inline::apply_styles_and_links(&text[marker.body.clone()]);
            notes.push(body)
        })
        .collect();

    let mut result = text.to_string();
    for (marker, id) in markers.iter().zip(ids).rev() {
        let start = result[..marker.span.start]
            .trim_end_matches([' ', '\t'])
            .len();
        result.replace_range(start..marker.span.end, &render_footnote_ref(id));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_simple_marker() {
        let text = "word [^note] more";
        let markers = find_markers(text);
        assert_eq!(markers.len(), 1);
        assert_eq!(&text[markers[0].span.clone()], "[^note]");
        assert_eq!(&text[markers[0].body.clone()], "note");
    }

    #[test]
    fn test_marker_with_nested_link() {
        let text = "x[^see [site](http://a.b/(c)) here] y";
        let markers = find_markers(text);
        assert_eq!(markers.len(), 1);
        assert_eq!(
            &text[markers[0].body.clone()],
            "see [site](http://a.b/(c)) here"
        );
    }

    #[test]
    fn test_backslash_skips_closing_bracket() {
        let text = r"a[^one \] two] b";
        let markers = find_markers(text);
        assert_eq!(markers.len(), 1);
        assert_eq!(&text[markers[0].body.clone()], r"one \] two");
    }

    #[test]
    fn test_unclosed_marker_is_ignored() {
        assert!(find_markers("dangling [^never closed").is_empty());
        let mut notes = Footnotes::new();
        assert_eq!(
            extract("dangling [^never closed", &mut notes),
            "dangling [^never closed"
        );
        assert!(notes.is_empty());
    }

    #[test]
    fn test_unclosed_marker_does_not_hide_later_one() {
        let markers = find_markers("[^a [^b]");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].span, 4..8);
    }

    #[test]
    fn test_ids_follow_appearance_order() {
        let mut notes = Footnotes::new();
        let out = extract("a[^first] b[^second]", &mut notes);
        assert_eq!(
            out,
            "a<sup><a href=\"#fn1\" id=\"fnref1\">1</a></sup> b<sup><a href=\"#fn2\" id=\"fnref2\">2</a></sup>"
        );
        assert_eq!(notes.bodies(), ["first", "second"]);
    }

    #[test]
    fn test_counter_continues_across_calls() {
        let mut notes = Footnotes::new();
        extract("a[^one]", &mut notes);
        let out = extract("b[^two]", &mut notes);
        assert!(out.contains("href=\"#fn2\""));
        assert_eq!(notes.bodies(), ["one", "two"]);
    }

    #[test]
    fn test_body_gets_styles_and_links() {
        let mut notes = Footnotes::new();
        extract("x [^a *b* [c](http://d)]", &mut notes);
        assert_eq!(notes.bodies(), ["a <em>b</em> <a href=\"http://d\">c</a>"]);
    }

    #[test]
    fn test_render_empty_is_nothing() {
        assert!(Footnotes::new().render().is_empty());
    }
}
