//! Error kinds surfaced by the scanner, resolver and installer.

use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum AddonError {
    /// The manifest file of a package does not exist.
    #[error("Manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The manifest exists but could not be read to the end.
    #[error("Failed to read manifest {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// No scrape hop produced a match.
    #[error("No {target} found at {url}")]
    LinkNotFound { url: String, target: String },

    /// Request or transport failure at any hop.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The downloaded archive is corrupt or unreadable.
    #[error("Failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem failure while writing the download or extracted entries.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl AddonError {
    pub(crate) fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        AddonError::Network {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn link_not_found(url: impl Into<String>, target: impl Into<String>) -> Self {
        AddonError::LinkNotFound {
            url: url.into(),
            target: target.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AddonError::Io {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_link_not_found(&self) -> bool {
        matches!(self, AddonError::LinkNotFound { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, AddonError::Network { .. })
    }

    pub fn is_manifest_not_found(&self) -> bool {
        matches!(self, AddonError::ManifestNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_not_found_display() {
        let err = AddonError::link_not_found("https://www.esoui.com/x", "link labelled \"Download\"");
        assert!(err.is_link_not_found());
        assert_eq!(
            err.to_string(),
            "No link labelled \"Download\" found at https://www.esoui.com/x"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = AddonError::io(
            "Failed to create /tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("Failed to create /tmp/x"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_from_anyhow() {
        let err = AddonError::io("Failed to write", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Failed to write: disk full");
    }

    #[test]
    fn test_manifest_not_found_display() {
        let err = AddonError::ManifestNotFound {
            path: PathBuf::from("AddOns/Foo/Foo.txt"),
        };
        assert!(err.is_manifest_not_found());
        assert!(!err.is_network());
        assert!(err.to_string().contains("Foo.txt"));
    }
}
