/// Configuration for the blog builder.
///
/// Parses `weblog.toml` with serde. Every field has a default, so an empty
/// file (or no file at all) describes a working setup. Relative paths are
/// resolved against the directory holding the config file.
///
/// CLI flags are applied on top of the loaded file via `CliSettings`.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::parser::{DEFAULT_ASSET_PREFIX, ParseOptions};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "weblog.toml";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub posts_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub base_url: Option<String>,
}

/// Builder configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site identity used by page templates, the feed and the sitemap.
    pub site: SiteConfig,
    /// Directory layout (relative strings from TOML).
    paths: PathsConfigRaw,
    /// URL prefix that replaces `~` in image paths.
    pub asset_prefix: String,

    /// Resolved directory layout (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin of the site, e.g. `https://example.github.io`.
    pub base_url: String,
    /// Path of the blog below the origin, with leading and trailing slash.
    pub blog_path: String,
    /// Blog name, used for the index heading.
    pub title: String,
    /// Appended to page titles and used in the feed title.
    pub author: String,
    /// Feed description.
    pub description: String,
    pub language: String,
    pub theme_color: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            blog_path: "/blog/".to_owned(),
            title: "Weblog".to_owned(),
            author: String::new(),
            description: String::new(),
            language: "en-us".to_owned(),
            theme_color: "#0c116c".to_owned(),
        }
    }
}

impl SiteConfig {
    /// Absolute URL of the blog index, with trailing slash.
    pub fn blog_url(&self) -> String {
        format!("{}{}", self.base_url, self.blog_path)
    }

    /// Absolute URL of a post page.
    pub fn post_url(&self, slug: &str) -> String {
        format!("{}{}.html", self.blog_url(), slug)
    }

    /// Make a root-relative path (`/x/y.png`) absolute; other values are
    /// returned as-is.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            path.to_owned()
        }
    }

    /// `Title - Author`, or just the title without an author.
    pub fn page_title(&self, title: &str) -> String {
        if self.author.is_empty() {
            title.to_owned()
        } else {
            format!("{} - {}", title, self.author)
        }
    }

    /// Feed channel title.
    pub fn feed_title(&self) -> String {
        if self.author.is_empty() {
            self.title.clone()
        } else {
            format!("{}'s {}", self.author, self.title)
        }
    }
}

/// Raw directory layout as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsConfigRaw {
    posts_dir: Option<String>,
    output_dir: Option<String>,
    assets_dir: Option<String>,
    sitemap_dir: Option<String>,
}

/// Resolved directory layout.
#[derive(Debug, Default, Clone)]
pub struct PathsConfig {
    /// Markdown posts (`*.md`).
    pub posts_dir: PathBuf,
    /// Generated pages, index and feed.
    pub output_dir: PathBuf,
    /// Images referenced by posts.
    pub assets_dir: PathBuf,
    /// Where `sitemap.xml` is written.
    pub sitemap_dir: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `config_path` must exist. Without one, `weblog.toml` is
    /// searched for in the current directory and its parents, falling back
    /// to defaults relative to the current directory.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse options for the markdown transformer.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            asset_prefix: self.asset_prefix.clone(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.site.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "site.base_url must start with http:// or https://, got {base_url:?}"
            )));
        }
        if !self.site.blog_path.starts_with('/') || !self.site.blog_path.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "site.blog_path must start and end with '/', got {:?}",
                self.site.blog_path
            )));
        }
        if !self.asset_prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "asset_prefix must start with '/', got {:?}",
                self.asset_prefix
            )));
        }
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(dir) = &settings.posts_dir {
            self.paths_resolved.posts_dir.clone_from(dir);
        }
        if let Some(dir) = &settings.output_dir {
            self.paths_resolved.output_dir.clone_from(dir);
        }
        if let Some(dir) = &settings.assets_dir {
            self.paths_resolved.assets_dir.clone_from(dir);
        }
        if let Some(url) = &settings.base_url {
            self.site.base_url = url.trim_end_matches('/').to_owned();
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Default config with paths relative to `base`.
    pub fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            site: SiteConfig::default(),
            paths: PathsConfigRaw::default(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_owned(),
            paths_resolved: PathsConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.site.base_url = config.site.base_url.trim_end_matches('/').to_owned();
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths_resolved = PathsConfig {
            posts_dir: resolve(self.paths.posts_dir.as_deref(), "blog_posts"),
            output_dir: resolve(self.paths.output_dir.as_deref(), "blog"),
            assets_dir: resolve(self.paths.assets_dir.as_deref(), "blog_assets"),
            sitemap_dir: resolve(self.paths.sitemap_dir.as_deref(), "."),
        };
    }
}
