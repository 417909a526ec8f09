use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use ghost_export_core::ImageReference;

use crate::{DownloadError, Downloader, ImageStore};

/// Downloads planned image references into the image store, one at a time.
///
/// Failures never abort the item: the body has already been rewritten to the
/// local path, so a failed download is logged and leaves a dangling reference.
pub struct ImageLocalizer {
    downloader: Arc<dyn Downloader>,
    store: ImageStore,
    skip_downloads: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ImageLocalizer {
    pub fn new(downloader: Arc<dyn Downloader>, store: ImageStore, skip_downloads: bool) -> Self {
        Self {
            downloader,
            store,
            skip_downloads,
        }
    }

    pub async fn download_all(&self, references: &[ImageReference]) -> DownloadReport {
        let mut report = DownloadReport::default();
        if self.skip_downloads {
            report.skipped = references.len();
            return report;
        }
        for reference in references {
            match self.download(reference).await {
                Ok(path) => {
                    engine_debug!("stored {} at {}", reference.matched_text, path.display());
                    report.downloaded += 1;
                }
                Err(err) => {
                    engine_warn!("failed to download {}: {err}", reference.download_url());
                    report.failed += 1;
                }
            }
        }
        report
    }

    pub async fn download(&self, reference: &ImageReference) -> Result<PathBuf, DownloadError> {
        let stream = self.downloader.fetch(&reference.download_url()).await?;
        self.store.store(&reference.destination(), stream).await
    }
}
