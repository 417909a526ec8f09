//! Ghost export engine: backend access, image downloads, output files and
//! run orchestration.
mod config;
mod download;
mod export;
mod localize;
mod persist;
mod source;
mod store;
mod types;

pub use config::ExportConfig;
pub use download::{ByteStream, DownloadSettings, Downloader, ReqwestDownloader};
pub use export::{run_export, run_with, ContentExporter, ExportError, RunSummary};
pub use localize::{DownloadReport, ImageLocalizer};
pub use persist::{
    ensure_output_dir, prepare_output_dir, AtomicFileWriter, PersistError, IMAGES_DIR,
};
pub use source::{
    ContentSource, GhostContentClient, LinkedEntity, RawContent, SiteSettings, SourceError,
};
pub use store::ImageStore;
pub use types::{DownloadError, DownloadFailureKind};
