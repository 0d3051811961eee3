/// Image directives: `<!--img src: ... alt: ... caption: ... source: ... class: ... -->`
///
/// The directive may span several lines. Each field runs from its label to
/// the next label or the end of the comment, and a label only counts at the
/// start of the directive or after whitespace.
use crate::footnotes::{self, Footnotes};
use crate::inline;
use crate::renderer::{escape_html, render_image};

pub const IMAGE_MARKER: &str = "<!--img";
pub const COMMENT_CLOSE: &str = "-->";

const SRC: &str = "src:";
const ALT: &str = "alt:";
const CAPTION: &str = "caption:";
const SOURCE: &str = "source:";
const CLASS: &str = "class:";
const LABELS: [&str; 5] = [SRC, ALT, CAPTION, SOURCE, CLASS];

/// Label prepended to attribution text in the caption.
const SOURCE_PREFIX: &str = "Source: ";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImageDirective {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    /// Attribution / credit line.
    pub source: Option<String>,
    pub class: Option<String>,
}

impl ImageDirective {
    /// Parse the raw comment text (marker through closing `-->`, newlines
    /// included). Missing or empty fields are `None`.
    pub fn parse(comment: &str) -> Self {
        let body = match comment.find(IMAGE_MARKER) {
            Some(pos) => &comment[pos + IMAGE_MARKER.len()..],
            None => comment,
        };
        let body = match body.find(COMMENT_CLOSE) {
            Some(end) => &body[..end],
            None => body,
        };

        // (position, label) for every label occurrence, in order
        let mut found: Vec<(usize, &str)> = Vec::new();
        let mut prev_is_space = true;
        for (pos, c) in body.char_indices() {
            if prev_is_space
                && let Some(label) = LABELS.iter().find(|label| body[pos..].starts_with(**label))
            {
                found.push((pos, *label));
            }
            prev_is_space = c.is_whitespace();
        }

        let mut directive = ImageDirective::default();
        for (idx, &(pos, label)) in found.iter().enumerate() {
            let end = found.get(idx + 1).map_or(body.len(), |next| next.0);
            let value = body[pos + label.len()..end].trim();
            if value.is_empty() {
                continue;
            }
            let slot = match label {
                SRC => &mut directive.src,
                ALT => &mut directive.alt,
                CAPTION => &mut directive.caption,
                SOURCE => &mut directive.source,
                _ => &mut directive.class,
            };
            // first occurrence wins
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        directive
    }

    /// Source path with a leading `~` replaced by `asset_prefix`.
    pub fn resolved_src(&self, asset_prefix: &str) -> Option<String> {
        let src = self.src.as_deref()?;
        Some(match src.strip_prefix('~') {
            Some(rest) => format!("{}{}", asset_prefix, rest),
            None => src.to_string(),
        })
    }

    /// Render the directive, registering caption footnotes in `notes`.
    /// Returns `None` when there is no source path.
    pub fn render(&self, asset_prefix: &str, notes: &mut Footnotes) -> Option<String> {
        let src = self.resolved_src(asset_prefix)?;

        let mut caption = match self.caption.as_deref() {
            Some(text) => {
                let extracted = footnotes::extract(&escape_html(text), notes);
                inline::apply_styles_and_links(&extracted).replace("\\n", "<br>")
            }
            None => String::new(),
        };

        if let Some(source) = self.source.as_deref() {
            let credit = inline::apply_styles_and_links(&escape_html(source));
            if !caption.is_empty() {
                caption.push_str("<br>");
            }
            caption.push_str(SOURCE_PREFIX);
            caption.push_str(&credit);
        }

        Some(render_image(self, &src, &caption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let directive =
            ImageDirective::parse("<!--img src: ~/photo.webp alt: A cat caption: Cute! -->");
        assert_eq!(directive.src.as_deref(), Some("~/photo.webp"));
        assert_eq!(directive.alt.as_deref(), Some("A cat"));
        assert_eq!(directive.caption.as_deref(), Some("Cute!"));
        assert_eq!(directive.source, None);
        assert_eq!(directive.class, None);
    }

    #[test]
    fn test_parse_multi_line_field_spans_lines() {
        let directive = ImageDirective::parse(
            "<!--img\nsrc: /a.png\ncaption: first line\n  still caption\nclass: spatial\n-->",
        );
        assert_eq!(directive.src.as_deref(), Some("/a.png"));
        assert_eq!(
            directive.caption.as_deref(),
            Some("first line\n  still caption")
        );
        assert_eq!(directive.class.as_deref(), Some("spatial"));
    }

    #[test]
    fn test_label_inside_word_is_not_a_label() {
        let directive = ImageDirective::parse("<!--img src: /a.png caption: basalt: rock -->");
        assert_eq!(directive.caption.as_deref(), Some("basalt: rock"));
        assert_eq!(directive.alt, None);
    }

    #[test]
    fn test_url_in_source_field() {
        let directive = ImageDirective::parse(
            "<!--img src: /a.png source: [Flickr](https://flickr.com/x) -->",
        );
        assert_eq!(
            directive.source.as_deref(),
            Some("[Flickr](https://flickr.com/x)")
        );
    }

    #[test]
    fn test_missing_src_renders_nothing() {
        let directive = ImageDirective::parse("<!--img alt: nothing here -->");
        let mut notes = Footnotes::new();
        assert_eq!(directive.render("/blog_assets", &mut notes), None);
    }

    #[test]
    fn test_tilde_rewrite() {
        let directive = ImageDirective::parse("<!--img src: ~/x.png -->");
        assert_eq!(
            directive.resolved_src("/blog_assets").as_deref(),
            Some("/blog_assets/x.png")
        );
    }

    #[test]
    fn test_caption_and_source() {
        let directive = ImageDirective::parse(
            "<!--img src: /a.png caption: Line one\\nLine *two* source: **Me** -->",
        );
        let mut notes = Footnotes::new();
        let html = directive.render("/blog_assets", &mut notes).unwrap();
        assert_eq!(
            html,
            "<figure>\n<img src=\"/a.png\" alt=\"\">\n<figcaption>Line one<br>Line <em>two</em><br>Source: <strong>Me</strong></figcaption>\n</figure>"
        );
    }

    #[test]
    fn test_source_only_caption() {
        let directive = ImageDirective::parse("<!--img src: /a.png source: NASA -->");
        let mut notes = Footnotes::new();
        let html = directive.render("/blog_assets", &mut notes).unwrap();
        assert!(html.contains("<figcaption>Source: NASA</figcaption>"));
    }

    #[test]
    fn test_caption_footnote_registers() {
        let directive = ImageDirective::parse("<!--img src: /a.png caption: A bird[^A heron.] -->");
        let mut notes = Footnotes::new();
        let html = directive.render("/blog_assets", &mut notes).unwrap();
        assert!(html.contains("A bird<sup><a href=\"#fn1\" id=\"fnref1\">1</a></sup>"));
        assert_eq!(notes.bodies(), ["A heron."]);
    }
}
