/// Whole-site build: posts directory in, pages + index + feed + sitemap out.
///
/// Each post is transformed independently, so posts are processed in
/// parallel with rayon. The transform of a single post is sequential.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::assets::{self, AssetReport, FallbackSource};
use crate::config::Config;
use crate::dates::{self, PostDate};
use crate::metadata::{parse_metadata, slug_from_file_stem, strip_metadata};
use crate::parser::Parser;
use crate::site::{self, Post};

const POST_EXTENSION: &str = "md";
const INDEX_FILE: &str = "index.html";
const FEED_FILE: &str = "feed.xml";
const SITEMAP_FILE: &str = "sitemap.xml";

/// Error returned by the site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Posts directory not found: {}", .0.display())]
    MissingPostsDir(PathBuf),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Failed to read directory entry: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("Duplicate slug `{slug}` from {} and {}", first.display(), second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Slugs of the generated posts, newest first.
    pub posts: Vec<String>,
    /// Every file written, in write order.
    pub written: Vec<PathBuf>,
    /// WebP assets that got a `.jpg` fallback during this build.
    pub converted: Vec<PathBuf>,
    /// WebP/HEIC assets still without a `.jpg` sibling.
    pub missing_fallbacks: Vec<PathBuf>,
}

pub struct SiteBuilder {
    config: Config,
    parser: Parser,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        let parser = Parser::with_options(config.parse_options());
        SiteBuilder { config, parser }
    }

    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let paths = &self.config.paths_resolved;
        let prepared = self.prepare_assets()?;
        let mut report = BuildReport {
            converted: prepared.converted,
            missing_fallbacks: prepared.missing,
            ..BuildReport::default()
        };

        let sources = self.discover_posts()?;
        tracing::info!(
            count = sources.len(),
            dir = %paths.posts_dir.display(),
            "Found posts"
        );

        let mut posts = sources
            .par_iter()
            .map(|path| self.load_post(path))
            .collect::<Result<Vec<_>, _>>()?;
        check_unique_slugs(&posts, &sources)?;

        fs::create_dir_all(&paths.output_dir).map_err(|e| BuildError::io(&paths.output_dir, e))?;
        let site = &self.config.site;

        for post in &posts {
            let path = paths.output_dir.join(format!("{}.html", post.slug));
            write_file(&path, &site::render_post_page(post, site))?;
            report.written.push(path);
        }

        // Newest first; the sort is stable so equal dates keep file order
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        let index_path = paths.output_dir.join(INDEX_FILE);
        write_file(&index_path, &site::render_index(&posts, site))?;
        report.written.push(index_path);

        let feed_path = paths.output_dir.join(FEED_FILE);
        let feed = site::render_rss(
            &posts,
            site,
            &self.config.asset_prefix,
            &dates::rfc822_now(),
        );
        write_file(&feed_path, &feed)?;
        report.written.push(feed_path);

        fs::create_dir_all(&paths.sitemap_dir).map_err(|e| BuildError::io(&paths.sitemap_dir, e))?;
        let sitemap_path = paths.sitemap_dir.join(SITEMAP_FILE);
        write_file(&sitemap_path, &site::render_sitemap(&posts, site))?;
        report.written.push(sitemap_path);

        report.posts = posts.into_iter().map(|post| post.slug).collect();
        Ok(report)
    }

    /// Sorted `*.md` files in the posts directory.
    pub fn discover_posts(&self) -> Result<Vec<PathBuf>, BuildError> {
        let dir = &self.config.paths_resolved.posts_dir;
        if !dir.is_dir() {
            return Err(BuildError::MissingPostsDir(dir.clone()));
        }
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            POST_EXTENSION
        );
        let mut files = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
        files.sort();
        tracing::debug!(pattern = %pattern, count = files.len(), "Scanned posts directory");
        Ok(files)
    }

    fn load_post(&self, path: &Path) -> Result<Post, BuildError> {
        let source = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let post = self.render_post(slug_from_file_stem(&stem), &source);
        tracing::debug!(path = %path.display(), slug = %post.slug, "Rendered post");
        Ok(post)
    }

    /// Turn the raw text of a post file into a rendered [`Post`].
    ///
    /// Bad dates never fail the build: an unreadable publish date is shown
    /// verbatim and the post is dated at build time; an unreadable update
    /// date is shown verbatim.
    pub fn render_post(&self, slug: &str, source: &str) -> Post {
        let metadata = parse_metadata(source);
        let body = self.parser.parse(strip_metadata(source));

        let raw_date = metadata.date.as_deref().unwrap_or("");
        let (date, date_display) = match PostDate::parse(raw_date, metadata.time()) {
            Ok(date) => (date, date.display()),
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Unreadable post date, using build time");
                (PostDate::now(), raw_date.to_owned())
            }
        };

        let updated_display = metadata.updated.as_deref().map(|updated| {
            match PostDate::parse(updated, metadata.updated_time()) {
                Ok(date) => date.display(),
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Unreadable update date");
                    updated.to_owned()
                }
            }
        });

        Post {
            slug: slug.to_owned(),
            content: site::wrap_article(&body),
            metadata,
            date,
            date_display,
            updated_display,
        }
    }

    /// Give every WebP image in the assets directory a `.jpg` sibling.
    ///
    /// Existing `.jpg` files are left alone. HEIC images and WebP images
    /// that fail to convert are reported as missing rather than failing the
    /// build.
    pub fn prepare_assets(&self) -> Result<AssetReport, BuildError> {
        let dir = &self.config.paths_resolved.assets_dir;
        let mut report = AssetReport::default();
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "No assets directory, skipping conversion");
            return Ok(report);
        }

        let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
        let mut pending = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
            let Some(kind) = FallbackSource::from_path(&path) else {
                continue;
            };
            if assets::jpg_path(&path).exists() {
                continue;
            }
            match kind {
                FallbackSource::WebP => pending.push(path),
                FallbackSource::Heic => {
                    tracing::warn!(path = %path.display(), "HEIC image has no .jpg fallback");
                    report.missing.push(path);
                }
            }
        }

        let results: Vec<_> = pending
            .into_par_iter()
            .map(|path| {
                let result = assets::convert_to_jpg(&path, &assets::jpg_path(&path));
                (path, result)
            })
            .collect();
        for (path, result) in results {
            match result {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Converted to JPG");
                    report.converted.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to convert image");
                    report.missing.push(path);
                }
            }
        }

        report.converted.sort();
        report.missing.sort();
        Ok(report)
    }
}

fn check_unique_slugs(posts: &[Post], sources: &[PathBuf]) -> Result<(), BuildError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for (post, path) in posts.iter().zip(sources) {
        if let Some(first) = seen.insert(post.slug.as_str(), path.as_path()) {
            return Err(BuildError::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_path_buf(),
                second: path.clone(),
            });
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|e| BuildError::io(path, e))?;
    tracing::info!(path = %path.display(), "Generated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_in(base: &Path) -> SiteBuilder {
        SiteBuilder::new(Config::default_with_base(base))
    }

    #[test]
    fn test_render_post_with_bad_date_keeps_raw_text() {
        let builder = builder_in(Path::new("/unused"));
        let post = builder.render_post(
            "p",
            "<!--\ntitle: P\ndate: soon\nupdated: 2024-02-30\n-->\nText",
        );
        assert_eq!(post.date_display, "soon");
        assert_eq!(post.updated_display.as_deref(), Some("2024-02-30"));
        assert_eq!(post.content, "<article>\n\n<p>Text</p>\n</article>");
    }

    #[test]
    fn test_render_post_formats_dates() {
        let builder = builder_in(Path::new("/unused"));
        let post = builder.render_post(
            "p",
            "<!--\ndate: 2024-03-03\ntime: 09:05\nupdated: 2024-07-22\nupdated_time: 18:30\n-->\n",
        );
        assert_eq!(post.date_display, "March 3rd, 2024 at 9:05 AM PST");
        assert_eq!(
            post.updated_display.as_deref(),
            Some("July 22nd, 2024 at 6:30 PM PDT")
        );
    }

    #[test]
    fn test_missing_posts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder_in(dir.path()).build().unwrap_err();
        assert!(matches!(err, BuildError::MissingPostsDir(_)));
    }

    #[test]
    fn test_prepare_assets_reports_unconvertible() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("blog_assets");
        fs::create_dir_all(&assets).unwrap();
        for name in ["a.webp", "a.jpg", "b.HEIC", "c.png", "d.webp"] {
            fs::write(assets.join(name), b"").unwrap();
        }
        let report = builder_in(dir.path()).prepare_assets().unwrap();
        assert!(report.converted.is_empty());
        assert_eq!(report.missing, vec![assets.join("b.HEIC"), assets.join("d.webp")]);
        // existing fallback untouched
        assert_eq!(fs::read(assets.join("a.jpg")).unwrap(), b"");
    }

    #[test]
    fn test_duplicate_slugs_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("blog_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("2024-01-01-same.md"), "one").unwrap();
        fs::write(posts.join("same.md"), "two").unwrap();
        let err = builder_in(dir.path()).build().unwrap_err();
        assert!(matches!(err, BuildError::DuplicateSlug { ref slug, .. } if slug == "same"));
    }
}
