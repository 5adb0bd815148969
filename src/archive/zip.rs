use log::{debug, info, warn};
use std::io::{Read, Seek};
use std::path::{Component, Path};
use zip::ZipArchive;

use crate::error::AddonError;
use crate::runtime::Runtime;

/// Extractor for .zip archives
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract every entry to `install_dir/<entry name>`.
    ///
    /// Returns the top-level folder names found in the archive, in order of
    /// first appearance. Extraction is not transactional: entries written
    /// before a failure stay on disk, and extracting again overwrites them.
    #[tracing::instrument(skip(self, runtime, archive))]
    pub fn extract<R: Runtime, A: Read + Seek>(
        &self,
        runtime: &R,
        archive: A,
        install_dir: &Path,
    ) -> Result<Vec<String>, AddonError> {
        debug!("Extracting zip archive to {:?}...", install_dir);
        let mut archive = ZipArchive::new(archive)?;
        let mut top_level: Vec<String> = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;

            let entry_path = match entry.enclosed_name() {
                Some(path) => path.to_path_buf(),
                None => {
                    warn!("Skipping entry with unsafe path {:?}", entry.name());
                    continue;
                }
            };

            let mut components = entry_path.components();
            if let Some(Component::Normal(first)) = components.next()
                && (entry.is_dir() || components.next().is_some())
            {
                let first = first.to_string_lossy().into_owned();
                if !top_level.contains(&first) {
                    top_level.push(first);
                }
            }

            let full_path = install_dir.join(&entry_path);

            if entry.is_dir() {
                runtime
                    .create_dir_all(&full_path)
                    .map_err(|e| AddonError::io(format!("Failed to create {:?}", full_path), e))?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime
                    .create_dir_all(parent)
                    .map_err(|e| AddonError::io(format!("Failed to create {:?}", parent), e))?;
            }

            // A previous install may have left the file read-only
            #[cfg(unix)]
            if runtime.exists(&full_path)
                && let Err(e) = runtime.set_permissions(&full_path, 0o644)
            {
                debug!("Failed to make {:?} writable: {}", full_path, e);
            }

            {
                let mut dest_file = runtime
                    .create_file(&full_path)
                    .map_err(|e| AddonError::io(format!("Failed to create {:?}", full_path), e))?;
                std::io::copy(&mut entry, &mut dest_file)
                    .map_err(|e| AddonError::io(format!("Failed to extract file {:?}", full_path), e))?;
            }

            // Set file permissions from archive metadata (Unix only)
            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode & 0o7777)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        info!("Extraction complete.");
        Ok(top_level)
    }
}
