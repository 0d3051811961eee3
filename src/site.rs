/// Page, index, feed and sitemap rendering.
///
/// Everything here is string assembly around the HTML produced by
/// `markdown_to_html`; no markdown is parsed in this module.
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

use crate::config::SiteConfig;
use crate::dates::PostDate;
use crate::metadata::Metadata;
use crate::renderer::escape_html;

/// Matches the extension of a WebP/HEIC URL at the end of an attribute value.
static MODERN_IMAGE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\.(?:webp|heic)""#).unwrap());

/// Image path prefix used by hand-written HTML that points outside the blog.
const PORTFOLIO_ASSETS: &str = "../portfolio_assets/";

/// A fully rendered post.
#[derive(Debug, Clone)]
pub struct Post {
    pub slug: String,
    pub metadata: Metadata,
    /// Article HTML (`<article>` wrapper included).
    pub content: String,
    /// Publish time; posts with an unreadable date carry the build time.
    pub date: PostDate,
    pub date_display: String,
    pub updated_display: Option<String>,
}

impl Post {
    pub fn title(&self) -> &str {
        self.metadata.title()
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }
}

/// Wrap a transformed body in the article element used by pages and feed.
pub fn wrap_article(body: &str) -> String {
    format!("<article>\n\n{}\n</article>", body)
}

/// Escape text for use inside a double-quoted attribute or XML text.
fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

fn push_head_common(html: &mut String, site: &SiteConfig, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0, viewport-fit=cover\">\n");
    let _ = writeln!(
        html,
        "    <meta name=\"theme-color\" content=\"{}\">",
        escape_attr(&site.theme_color)
    );
    let _ = writeln!(html, "    <title>{}</title>", escape_html(title));
    html.push('\n');
    html.push_str("    <link rel=\"icon\" type=\"image/png\" href=\"/favicon.ico\">\n");
    html.push_str("    <link rel=\"apple-touch-icon\" href=\"/Favicon/favicon.png\">\n");
}

/// Render the standalone page for one post.
pub fn render_post_page(post: &Post, site: &SiteConfig) -> String {
    let mut html = String::with_capacity(post.content.len() + 4096);
    let title = escape_attr(post.title());
    let description = escape_attr(post.description());
    let url = site.post_url(&post.slug);

    push_head_common(&mut html, site, &site.page_title(post.title()));
    html.push('\n');
    let _ = writeln!(html, "    <meta name=\"description\" content=\"{}\">", description);
    let _ = writeln!(html, "    <link rel=\"canonical\" href=\"{}\">", url);
    html.push('\n');
    html.push_str("    <meta property=\"og:type\" content=\"article\">\n");
    let _ = writeln!(html, "    <meta property=\"og:title\" content=\"{}\">", title);
    let _ = writeln!(
        html,
        "    <meta property=\"og:description\" content=\"{}\">",
        description
    );
    let _ = writeln!(html, "    <meta property=\"og:url\" content=\"{}\">", url);
    let hero = post
        .metadata
        .image
        .as_deref()
        .map(|image| escape_attr(&site.absolute_url(image)));
    if let Some(hero) = &hero {
        let _ = writeln!(html, "    <meta property=\"og:image\" content=\"{}\">", hero);
    }
    html.push('\n');
    let _ = writeln!(html, "    <meta name=\"twitter:title\" content=\"{}\">", title);
    let _ = writeln!(
        html,
        "    <meta name=\"twitter:description\" content=\"{}\">",
        description
    );
    if let Some(hero) = &hero {
        html.push_str("    <meta name=\"twitter:card\" content=\"summary_large_image\">\n");
        let _ = writeln!(html, "    <meta name=\"twitter:image\" content=\"{}\">", hero);
    }
    html.push('\n');
    html.push_str("    <link rel=\"stylesheet\" href=\"/styles.css\">\n");
    html.push_str("    <link rel=\"stylesheet\" href=\"/blog.css\">\n");
    html.push_str("</head>\n<body>\n");
    html.push_str("    <main class=\"content\">\n");
    html.push_str("        <div style=\"max-width: 900px; margin: 0 auto;\">\n");
    html.push_str("            <a href=\"index.html\" class=\"back-link\">← Back to weblog</a>\n");
    let _ = writeln!(html, "            <h1 class=\"post-title\">{}</h1>", escape_html(post.title()));
    let _ = write!(
        html,
        "            <p class=\"post-date\" style=\"text-align: center;\">{}</p>",
        escape_html(&post.date_display)
    );
    if let Some(updated) = &post.updated_display {
        let _ = write!(
            html,
            "<p class=\"post-date\" style=\"text-align: center; font-size: 0.9em; margin-top: -15px;\">Updated: {}</p>",
            escape_html(updated)
        );
    }
    html.push('\n');
    html.push_str(&post.content);
    html.push_str("\n            <br>\n");
    html.push_str("            <a href=\"index.html\" class=\"back-link\">← Back to weblog</a>\n");
    html.push_str("        </div>\n    </main>\n");
    html.push_str(SPATIAL_PHOTO_SCRIPT);
    html.push_str("</body>\n</html>");
    html
}

/// Click-to-fullscreen for `img.spatial` and `picture.spatial img`.
const SPATIAL_PHOTO_SCRIPT: &str = r"    <script>
        document.addEventListener('DOMContentLoaded', function() {
            const spatialPhotos = document.querySelectorAll('img.spatial, picture.spatial img');
            spatialPhotos.forEach(function(img) {
                img.addEventListener('click', async function() {
                    try {
                        await img.requestFullscreen();
                    } catch (error) {
                        console.log('Fullscreen not supported or denied');
                    }
                });
            });
        });
    </script>
";

/// Render the blog index. `posts` must already be sorted newest first.
pub fn render_index(posts: &[Post], site: &SiteConfig) -> String {
    let mut html = String::with_capacity(2048 + posts.len() * 256);

    push_head_common(&mut html, site, &site.page_title(&site.title));
    html.push('\n');
    html.push_str("    <link rel=\"stylesheet\" href=\"/styles.css\">\n");
    html.push_str("    <link rel=\"stylesheet\" href=\"/blog.css\">\n");
    let _ = writeln!(
        html,
        "    <link rel=\"alternate\" type=\"application/rss+xml\" title=\"{}\" href=\"feed.xml\">",
        escape_attr(&site.feed_title())
    );
    html.push_str("</head>\n<body>\n");
    html.push_str("    <main class=\"content\">\n");
    html.push_str("        <div class=\"blog-container\">\n");
    html.push_str("            <a href=\"/\" class=\"back-home\">← Back to home</a>\n");
    html.push_str("            <a href=\"feed.xml\" class=\"rss-link\">RSS Feed</a>\n");
    let _ = writeln!(
        html,
        "            <h1 class=\"blog-title\">{}</h1>",
        escape_html(&site.title)
    );
    for post in posts {
        let _ = write!(
            html,
            "
        <a href=\"{}.html\" class=\"blog-post-preview\">
            <div>
                <h3>{}</h3>
                <p class=\"post-date\">{}</p>
                <p>{}</p>
            </div>
        </a>
",
            post.slug,
            escape_html(post.title()),
            escape_html(&post.date_display),
            escape_html(post.description())
        );
    }
    html.push_str("        </div>\n    </main>\n</body>\n</html>");
    html
}

/// Rewrite article HTML for feed readers: absolute image URLs and JPG in
/// place of WebP/HEIC.
pub fn feed_content(content: &str, site: &SiteConfig, asset_prefix: &str) -> String {
    let local_assets = format!("src=\"{}/", asset_prefix);
    let absolute_assets = format!("src=\"{}{}/", site.base_url, asset_prefix);
    let content = content.replace(&local_assets, &absolute_assets);
    let content = content.replace(
        &format!("src=\"{}", PORTFOLIO_ASSETS),
        &format!("src=\"{}/portfolio_assets/", site.base_url),
    );
    MODERN_IMAGE_EXT_RE
        .replace_all(&content, ".jpg\"")
        .into_owned()
}

/// Wrap text in CDATA, splitting any `]]>` it contains.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Render the RSS 2.0 feed. `posts` must already be sorted newest first.
pub fn render_rss(posts: &[Post], site: &SiteConfig, asset_prefix: &str, build_date: &str) -> String {
    let blog_url = site.blog_url();
    let mut xml = String::with_capacity(4096);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\">\n");
    xml.push_str("  <channel>\n");
    let _ = writeln!(xml, "    <title>{}</title>", escape_attr(&site.feed_title()));
    let _ = writeln!(xml, "    <link>{}</link>", blog_url);
    let _ = writeln!(xml, "    <description>{}</description>", escape_attr(&site.description));
    let _ = writeln!(xml, "    <language>{}</language>", escape_attr(&site.language));
    let _ = writeln!(xml, "    <lastBuildDate>{}</lastBuildDate>", build_date);
    let _ = writeln!(
        xml,
        "    <atom:link href=\"{}feed.xml\" rel=\"self\" type=\"application/rss+xml\" />",
        blog_url
    );

    for post in posts {
        let url = site.post_url(&post.slug);
        let mut body = String::new();
        if let Some(updated) = &post.updated_display {
            let _ = write!(body, "<p><em>Updated: {}</em></p>\n\n", escape_html(updated));
        }
        body.push_str(&feed_content(&post.content, site, asset_prefix));

        xml.push_str("    <item>\n");
        let _ = writeln!(xml, "        <title>{}</title>", escape_attr(post.title()));
        let _ = writeln!(xml, "        <link>{}</link>", url);
        let _ = writeln!(xml, "        <guid>{}</guid>", url);
        let _ = writeln!(xml, "        <pubDate>{}</pubDate>", post.date.rfc822_utc());
        let _ = writeln!(
            xml,
            "        <description>{}</description>",
            escape_attr(post.description())
        );
        if let Some(image) = &post.metadata.image {
            let _ = writeln!(
                xml,
                "        <enclosure url=\"{}\" type=\"image/jpeg\" />",
                escape_attr(&site.absolute_url(image))
            );
        }
        let _ = writeln!(xml, "        <content:encoded>{}</content:encoded>", cdata(&body));
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n</rss>");
    xml
}

/// Render `sitemap.xml`: site root, blog index, then one entry per post.
pub fn render_sitemap(posts: &[Post], site: &SiteConfig) -> String {
    let mut xml = String::with_capacity(1024 + posts.len() * 160);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    let _ = write!(
        xml,
        "  <url>\n    <loc>{}/</loc>\n    <changefreq>monthly</changefreq>\n    <priority>1.0</priority>\n  </url>\n",
        site.base_url
    );
    let _ = write!(
        xml,
        "  <url>\n    <loc>{}</loc>\n    <changefreq>weekly</changefreq>\n    <priority>0.9</priority>\n  </url>\n",
        site.blog_url()
    );
    for post in posts {
        let _ = write!(
            xml,
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>monthly</changefreq>\n    <priority>0.8</priority>\n  </url>\n",
            site.post_url(&post.slug),
            post.date.w3c_date()
        );
    }
    xml.push_str("</urlset>");
    xml
}
