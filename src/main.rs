/// weblog CLI.
///
/// - `build`: generate post pages, index, feed and sitemap
/// - `render`: transform one post (or stdin) and print the HTML body
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

use weblog::metadata::strip_metadata;
use weblog::parser::Parser;
use weblog::{BuildError, CliSettings, Config, ConfigError, SiteBuilder};

/// Static blog generator.
#[derive(ClapParser)]
#[command(name = "weblog", version, about)]
struct Cli {
    /// Log progress at info level (otherwise RUST_LOG, default warn).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the whole blog.
    Build(BuildArgs),
    /// Print the HTML body of a single post.
    Render(RenderArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Path to configuration file (default: auto-discover weblog.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown posts directory (overrides config).
    #[arg(long)]
    posts_dir: Option<PathBuf>,

    /// Output directory for pages, index and feed (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Image assets directory (overrides config).
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Site origin, e.g. https://example.github.io (overrides config).
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct RenderArgs {
    /// Post file; reads stdin when omitted.
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover weblog.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl BuildArgs {
    fn execute(self) -> Result<(), CliError> {
        let settings = CliSettings {
            posts_dir: self.posts_dir,
            output_dir: self.output_dir,
            assets_dir: self.assets_dir,
            base_url: self.base_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        let report = SiteBuilder::new(config).build()?;

        eprintln!("Done! Generated {} posts.", report.posts.len());
        Ok(())
    }
}

impl RenderArgs {
    fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let input = match &self.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input)?;
                input
            }
        };
        let parser = Parser::with_options(config.parse_options());
        println!("{}", parser.parse(strip_metadata(&input)));
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Render(args) => args.execute(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
