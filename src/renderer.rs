/// HTML fragment emitters used by the block handlers
use crate::image::ImageDirective;

/// Escape `&`, `<` and `>`. Quotes are left alone.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_code_block(lines: &[&str]) -> String {
    format!("<pre><code>{}</code></pre>", escape_html(&lines.join("\n")))
}

pub fn render_heading(level: usize, content: &str) -> String {
    format!("<h{}>{}</h{}>", level, content, level)
}

pub fn render_footnote_ref(id: usize) -> String {
    format!(
        "<sup><a href=\"#fn{}\" id=\"fnref{}\">{}</a></sup>",
        id, id, id
    )
}

/// Render the trailing footnote section, one fragment per output line.
pub fn render_footnote_section(bodies: &[String]) -> Vec<String> {
    let mut fragments = vec![
        String::new(),
        "<br>".to_string(),
        String::new(),
        "<h2>Footnotes</h2>".to_string(),
        String::new(),
        "<ol>".to_string(),
    ];
    for (idx, body) in bodies.iter().enumerate() {
        let id = idx + 1;
        fragments.push(format!(
            "<li id=\"fn{}\">{} <a href=\"#fnref{}\">↩</a></li>",
            id, body, id
        ));
    }
    fragments.push("</ol>".to_string());
    fragments
}

/// Render an image directive. `caption` is the already-processed figcaption
/// content; when empty the bare image element is returned.
pub fn render_image(directive: &ImageDirective, src: &str, caption: &str) -> String {
    let alt = directive.alt.as_deref().unwrap_or("");
    let class = directive.class.as_deref().unwrap_or("");
    let class_attr = if class.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", class)
    };

    let element = match modern_image_mime(src) {
        Some(mime) => format!(
            "<picture{}>\n  <source srcset=\"{}\" type=\"{}\">\n  <img src=\"{}\" alt=\"{}\">\n</picture>",
            class_attr,
            src,
            mime,
            jpg_fallback(src),
            alt
        ),
        None => format!("<img src=\"{}\" alt=\"{}\"{}>", src, alt, class_attr),
    };

    if caption.is_empty() {
        element
    } else {
        format!(
            "<figure>\n{}\n<figcaption>{}</figcaption>\n</figure>",
            element, caption
        )
    }
}

/// MIME type for extensions that need a JPG fallback source.
fn modern_image_mime(src: &str) -> Option<&'static str> {
    let ext = src.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Swap a trailing `.webp` / `.heic` extension (any case) for `.jpg`.
pub fn jpg_fallback(src: &str) -> String {
    if let Some(dot) = src.rfind('.') {
        let ext = &src[dot + 1..];
        if ext.eq_ignore_ascii_case("webp") || ext.eq_ignore_ascii_case("heic") {
            return format!("{}.jpg", &src[..dot]);
        }
    }
    src.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_leaves_quotes() {
        assert_eq!(
            escape_html(r#"a < b && "c" > 'd'"#),
            r#"a &lt; b &amp;&amp; "c" &gt; 'd'"#
        );
    }

    #[test]
    fn test_code_block_escapes_body() {
        assert_eq!(
            render_code_block(&["if a < b {", "}"]),
            "<pre><code>if a &lt; b {\n}</code></pre>"
        );
    }

    #[test]
    fn test_jpg_fallback() {
        assert_eq!(jpg_fallback("/a/photo.WEBP"), "/a/photo.jpg");
        assert_eq!(jpg_fallback("/a/photo.heic"), "/a/photo.jpg");
        assert_eq!(jpg_fallback("/a/photo.png"), "/a/photo.png");
    }

    #[test]
    fn test_plain_image_with_class() {
        let directive = ImageDirective {
            src: Some("/x.png".to_string()),
            alt: Some("X".to_string()),
            class: Some("wide".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render_image(&directive, "/x.png", ""),
            "<img src=\"/x.png\" alt=\"X\" class=\"wide\">"
        );
    }

    #[test]
    fn test_picture_puts_class_on_picture() {
        let directive = ImageDirective {
            src: Some("/x.heic".to_string()),
            class: Some("spatial".to_string()),
            ..Default::default()
        };
        let html = render_image(&directive, "/x.heic", "");
        assert!(html.starts_with("<picture class=\"spatial\">"));
        assert!(html.contains("<source srcset=\"/x.heic\" type=\"image/heic\">"));
        assert!(html.contains("<img src=\"/x.jpg\" alt=\"\">"));
    }

    #[test]
    fn test_footnote_section_layout() {
        let fragments = render_footnote_section(&["one".to_string(), "two".to_string()]);
        assert_eq!(fragments[3], "<h2>Footnotes</h2>");
        assert_eq!(fragments[6], "<li id=\"fn1\">one <a href=\"#fnref1\">↩</a></li>");
        assert_eq!(fragments[7], "<li id=\"fn2\">two <a href=\"#fnref2\">↩</a></li>");
        assert_eq!(fragments.last().map(String::as_str), Some("</ol>"));
    }
}
