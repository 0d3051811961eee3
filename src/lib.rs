/// Static blog generator for a lightweight markdown dialect
///
/// The core is `markdown_to_html`, a single forward pass over the lines of a
/// post; the remaining modules turn a directory of posts into pages, an RSS
/// feed and a sitemap.
pub mod assets;
pub mod build;
pub mod config;
pub mod dates;
pub mod footnotes;
pub mod image;
pub mod inline;
pub mod metadata;
pub mod parser;
pub mod renderer;
pub mod site;

use parser::Parser;

pub use build::{BuildError, BuildReport, SiteBuilder};
pub use config::{CliSettings, Config, ConfigError};
pub use parser::ParseOptions;

/// Transform a post body (metadata comment already stripped) to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    Parser::new().parse(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html(""), "");
    }

    #[test]
    fn test_heading_with_footnote() {
        let result = markdown_to_html("# Hello [^note]");
        assert!(result.starts_with(
            "<h2>Hello<sup><a href=\"#fn1\" id=\"fnref1\">1</a></sup></h2>"
        ));
        assert!(result.contains("<h2>Footnotes</h2>"));
        assert!(result.contains("<li id=\"fn1\">note <a href=\"#fnref1\">↩</a></li>"));
    }

    #[test]
    fn test_webp_image_with_caption() {
        let result = markdown_to_html("<!--img src: ~/photo.webp alt: A cat caption: Cute! -->");
        assert_eq!(
            result,
            "<figure>\n<picture>\n  <source srcset=\"/blog_assets/photo.webp\" type=\"image/webp\">\n  <img src=\"/blog_assets/photo.jpg\" alt=\"A cat\">\n</picture>\n<figcaption>Cute!</figcaption>\n</figure>"
        );
    }
}
