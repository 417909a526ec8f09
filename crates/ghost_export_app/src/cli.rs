use std::path::PathBuf;

use clap::Parser;
use engine_logging::LogDestination;
use ghost_export_engine::{DownloadSettings, ExportConfig};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "ghost-export")]
#[command(version)]
#[command(about = "Export Ghost pages and posts as static-site source files", long_about = None)]
pub struct Cli {
    /// Ghost backend URL
    #[arg(long = "ghost-url", env = "GHOST_API_URL")]
    pub ghost_url: String,

    /// Content API key
    #[arg(long = "ghost-api-key", env = "GHOST_CONTENT_API_KEY", hide_env_values = true)]
    pub ghost_api_key: String,

    /// Public site URL written to site.json
    #[arg(long = "site-url", env = "SITE_URL")]
    pub site_url: Option<String>,

    /// Output directory (emptied before every run)
    #[arg(short, long, default_value = "./site")]
    pub out: PathBuf,

    /// Convert these slugs to Markdown as a whole
    #[arg(long = "markdown-slug", value_name = "SLUG", value_delimiter = ',')]
    pub markdown_slugs: Vec<String>,

    /// Leave these slugs out of the export
    #[arg(long = "skip-slug", value_name = "SLUG", value_delimiter = ',')]
    pub skip_slugs: Vec<String>,

    /// Rewrite image references without downloading them
    #[arg(long)]
    pub skip_images: bool,

    #[arg(long)]
    pub skip_pages: bool,

    #[arg(long)]
    pub skip_posts: bool,

    /// Dump each raw item as <slug>.json
    #[arg(short, long)]
    pub debug: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn into_config(self) -> ExportConfig {
        ExportConfig {
            debug: self.debug,
            output_dir: self.out,
            skip_images: self.skip_images,
            skip_pages: self.skip_pages,
            skip_posts: self.skip_posts,
            explicit_markdown_slugs: self.markdown_slugs,
            skip_slugs: self.skip_slugs,
            backend_base_url: self.ghost_url,
            backend_api_key: self.ghost_api_key,
            public_site_url: self.site_url,
            download: DownloadSettings::default(),
        }
    }
}
