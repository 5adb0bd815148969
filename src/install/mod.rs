use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

use crate::{
    archive::ZipExtractor, download::download_to_temp, error::AddonError, http::HttpClient,
    runtime::Runtime,
};

/// Materializes a binary download on disk.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    /// Download the archive at `url` and extract it into `install_dir`.
    ///
    /// Returns the top-level folder names the archive contained.
    async fn install(&self, url: &str, install_dir: &Path) -> Result<Vec<String>, AddonError>;
}

pub struct PackageInstaller<'a, R: Runtime> {
    runtime: &'a R,
    http_client: HttpClient,
    extractor: ZipExtractor,
    temp_dir: PathBuf,
}

impl<'a, R: Runtime> PackageInstaller<'a, R> {
    pub fn new(runtime: &'a R, http_client: HttpClient) -> Self {
        Self {
            runtime,
            http_client,
            extractor: ZipExtractor,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Keep downloads in `temp_dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

#[async_trait]
impl<R: Runtime> Installer for PackageInstaller<'_, R> {
    #[tracing::instrument(skip(self))]
    async fn install(&self, url: &str, install_dir: &Path) -> Result<Vec<String>, AddonError> {
        // Removed when `temp` goes out of scope, whatever the outcome
        let temp = download_to_temp(&self.http_client, url, &self.temp_dir).await?;

        info!("Extracting {} into {}", url, install_dir.display());
        let archive = temp
            .reopen()
            .map_err(|e| AddonError::io(format!("Failed to open {:?}", temp.path()), e))?;

        self.extractor.extract(self.runtime, archive, install_dir)
    }
}
