use std::path::PathBuf;

use crate::DownloadSettings;

/// Everything one export run needs, built once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Dump each raw item as `<slug>.json` next to its output.
    pub debug: bool,
    pub output_dir: PathBuf,
    pub skip_images: bool,
    pub skip_pages: bool,
    pub skip_posts: bool,
    /// Slugs converted to Markdown as a whole.
    pub explicit_markdown_slugs: Vec<String>,
    /// Slugs left out of the export.
    pub skip_slugs: Vec<String>,
    pub backend_base_url: String,
    pub backend_api_key: String,
    /// Replaces the backend URL in `site.json`.
    pub public_site_url: Option<String>,
    pub download: DownloadSettings,
}

impl ExportConfig {
    /// Backend base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.backend_base_url.trim_end_matches('/')
    }

    pub fn is_skipped(&self, slug: &str) -> bool {
        self.skip_slugs.iter().any(|s| s == slug)
    }
}
