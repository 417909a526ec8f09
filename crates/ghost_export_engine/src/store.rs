use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

use crate::{ByteStream, DownloadError, DownloadFailureKind};

/// Writes downloaded images below the output directory.
///
/// Each store is awaited to completion: bytes go to a `.part` sibling that is
/// flushed, synced and renamed into place before `store` returns.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn store(
        &self,
        relative: &Path,
        stream: ByteStream,
    ) -> Result<PathBuf, DownloadError> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(&target);
        if let Err(err) = write_stream(&partial, stream).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(err);
        }
        tokio::fs::rename(&partial, &target).await?;
        Ok(target)
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf, DownloadError> {
        let mut components = relative.components().peekable();
        if components.peek().is_none() {
            return Err(DownloadError::new(
                DownloadFailureKind::UnsafeDestination,
                "empty destination",
            ));
        }
        if components.any(|c| !matches!(c, Component::Normal(_))) {
            return Err(DownloadError::new(
                DownloadFailureKind::UnsafeDestination,
                format!("{} escapes the output directory", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

async fn write_stream(path: &Path, stream: ByteStream) -> Result<u64, DownloadError> {
    let mut reader = StreamReader::new(stream);
    let mut file = tokio::fs::File::create(path).await?;
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}
