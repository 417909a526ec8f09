//! Per-item and per-run orchestration.

use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_info};
use ghost_export_core::{
    plan_localization, transform_localized, ContentKind, ConversionError, Converter,
    HtmdConverter, ImagePlanner,
};
use thiserror::Error;

use crate::persist::{prepare_output_dir, AtomicFileWriter, PersistError};
use crate::source::{ContentSource, RawContent, SiteSettings, SourceError};
use crate::{Downloader, ExportConfig, ImageLocalizer, ImageStore};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid backend base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("cannot prepare output directory: {0}")]
    OutputDir(#[source] PersistError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("converting {slug} failed: {source}")]
    Conversion {
        slug: String,
        #[source]
        source: ConversionError,
    },
    #[error("serializing {target} failed: {source}")]
    Serialize {
        target: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing {target} failed: {source}")]
    Write {
        target: String,
        #[source]
        source: PersistError,
    },
}

impl ExportError {
    /// Fatal errors end the run; the rest only cost the current item.
    pub fn is_fatal(&self) -> bool {
        match self {
            ExportError::InvalidBaseUrl { .. }
            | ExportError::OutputDir(_)
            | ExportError::Source(_)
            | ExportError::Conversion { .. } => true,
            ExportError::Serialize { .. } | ExportError::Write { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub exported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Exports single items into an already prepared output directory.
pub struct ContentExporter {
    config: ExportConfig,
    planner: ImagePlanner,
    converter: Box<dyn Converter>,
    localizer: ImageLocalizer,
    writer: AtomicFileWriter,
}

impl ContentExporter {
    pub fn new(config: ExportConfig, downloader: Arc<dyn Downloader>) -> Result<Self, ExportError> {
        let planner =
            ImagePlanner::new(config.base_url()).map_err(|err| ExportError::InvalidBaseUrl {
                url: config.backend_base_url.clone(),
                message: err.to_string(),
            })?;
        let localizer = ImageLocalizer::new(
            downloader,
            ImageStore::new(config.output_dir.clone()),
            config.skip_images,
        );
        let writer = AtomicFileWriter::new(config.output_dir.clone());
        Ok(Self {
            config,
            planner,
            converter: Box::new(HtmdConverter::new()),
            localizer,
            writer,
        })
    }

    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Localizes, transforms and writes one item. Returns the written path.
    pub async fn export_item(
        &self,
        raw: RawContent,
        kind: ContentKind,
    ) -> Result<PathBuf, ExportError> {
        let raw = raw.with_root_relative_urls(self.config.base_url());
        if self.config.debug {
            self.write_json(&format!("{}.json", raw.slug), &raw)?;
        }

        let item = raw.into_content_item(kind);
        let plan = plan_localization(&self.planner, &item);
        let report = self.localizer.download_all(&plan.downloads).await;
        engine_debug!(
            "{}: {} images stored, {} failed, {} skipped",
            item.slug,
            report.downloaded,
            report.failed,
            report.skipped
        );

        let rendered = transform_localized(
            &item,
            plan.content,
            &self.config.explicit_markdown_slugs,
            self.converter.as_ref(),
        )
        .map_err(|source| ExportError::Conversion {
            slug: item.slug.clone(),
            source,
        })?;

        engine_info!("exporting {}", self.writer.dir().join(&rendered.filename).display());
        self.write_text(&rendered.filename, &rendered.text)
    }

    /// Writes `site.json` and downloads the logo, icon and cover image.
    pub async fn export_site(&self, settings: SiteSettings) -> Result<PathBuf, ExportError> {
        let assets: Vec<_> = settings
            .asset_urls()
            .map(|url| self.planner.site_asset(url))
            .collect();
        self.localizer.download_all(&assets).await;

        let settings = settings.with_site_url(self.config.public_site_url.as_deref());
        self.write_json("site.json", &settings)
    }

    fn write_json<T: serde::Serialize>(
        &self,
        target: &str,
        value: &T,
    ) -> Result<PathBuf, ExportError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| ExportError::Serialize {
            target: target.to_string(),
            source,
        })?;
        self.write_text(target, &json)
    }

    fn write_text(&self, target: &str, text: &str) -> Result<PathBuf, ExportError> {
        self.writer
            .write(target, text)
            .map_err(|source| ExportError::Write {
                target: target.to_string(),
                source,
            })
    }
}

/// Exports the whole site: settings, then pages, then posts, one item at a
/// time. Per-item write failures are logged and counted; fatal errors stop
/// the run and leave already exported files in place.
pub async fn run_export(
    config: ExportConfig,
    source: &dyn ContentSource,
    downloader: Arc<dyn Downloader>,
) -> Result<RunSummary, ExportError> {
    engine_info!("initializing output folder");
    prepare_output_dir(&config.output_dir).map_err(ExportError::OutputDir)?;
    let exporter = ContentExporter::new(config, downloader)?;
    run_with(&exporter, source).await
}

/// Runs an export with a preconfigured exporter. The output directory must
/// already be prepared.
pub async fn run_with(
    exporter: &ContentExporter,
    source: &dyn ContentSource,
) -> Result<RunSummary, ExportError> {
    let mut summary = RunSummary::default();

    engine_info!("getting site data");
    let settings = source.settings().await?;
    if let Err(err) = exporter.export_site(settings).await {
        if err.is_fatal() {
            return Err(err);
        }
        engine_error!("site settings not exported: {err}");
    }

    if !exporter.config().skip_pages {
        engine_info!("getting pages");
        let pages = source.pages().await?;
        engine_info!("exporting pages");
        export_collection(exporter, pages, ContentKind::Page, &mut summary).await?;
    }

    if !exporter.config().skip_posts {
        engine_info!("getting posts");
        let posts = source.posts().await?;
        engine_info!("exporting posts");
        export_collection(exporter, posts, ContentKind::Post, &mut summary).await?;
    }

    engine_info!(
        "export finished: {} exported, {} skipped, {} failed",
        summary.exported,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

async fn export_collection(
    exporter: &ContentExporter,
    items: Vec<RawContent>,
    kind: ContentKind,
    summary: &mut RunSummary,
) -> Result<(), ExportError> {
    for raw in items {
        if exporter.config().is_skipped(&raw.slug) {
            engine_debug!("skipping {}", raw.slug);
            summary.skipped += 1;
            continue;
        }
        let slug = raw.slug.clone();
        match exporter.export_item(raw, kind).await {
            Ok(_) => summary.exported += 1,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                engine_error!("failed to export {slug}: {err}");
                summary.failed += 1;
            }
        }
    }
    Ok(())
}
