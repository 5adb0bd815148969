use crate::error::AddonError;
use crate::http::HttpClient;
use log::info;
use std::path::Path;
use tempfile::NamedTempFile;

/// Downloads a URL into a fresh temporary file under `temp_dir`.
///
/// The file is deleted when the returned handle is dropped, on success and
/// failure paths alike.
#[tracing::instrument(skip(http_client))]
pub async fn download_to_temp(
    http_client: &HttpClient,
    url: &str,
    temp_dir: &Path,
) -> Result<NamedTempFile, AddonError> {
    let temp = tempfile::Builder::new()
        .prefix("addon-")
        .suffix(".zip")
        .tempfile_in(temp_dir)
        .map_err(|e| AddonError::io(format!("Failed to create temporary file in {:?}", temp_dir), e))?;

    info!("Downloading {} to {:?}", url, temp.path());

    http_client
        .download_file(url, || {
            temp.reopen()
                .map_err(|e| AddonError::io(format!("Failed to open temporary file {:?}", temp.path()), e))
        })
        .await?;

    info!("Download complete.");
    Ok(temp)
}
