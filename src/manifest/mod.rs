//! Installed add-on manifests.
//!
//! Every add-on lives in `<install_dir>/<name>/` and describes itself in
//! `<install_dir>/<name>/<name>.txt`. Recognised lines look like
//! `## Key: Value`; anything else is ignored so newer manifest keys never
//! break scanning.

mod dependency;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::error::AddonError;
use crate::runtime::Runtime;

pub use dependency::DependencyRef;
pub(crate) use dependency::is_url;

/// An installed (or freshly downloaded) add-on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Folder name, also the manifest file stem
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    /// Raw `DependsOn` tokens in declaration order
    pub dependencies: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Title for display, falling back to the folder name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Parsed view of [`Package::dependencies`].
    pub fn dependency_refs(&self) -> impl Iterator<Item = DependencyRef> + '_ {
        self.dependencies.iter().map(|d| DependencyRef::parse(d))
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "Title" => self.title = Some(value.to_string()),
            "Description" => self.description = Some(value.to_string()),
            "Version" => self.version = Some(value.to_string()),
            "DependsOn" => {
                self.dependencies = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {}
        }
    }
}

/// Conventional manifest location for a package.
pub fn manifest_path(install_dir: &Path, name: &str) -> PathBuf {
    install_dir.join(name).join(format!("{}.txt", name))
}

/// Split a `## Key: Value` directive into its key and trimmed value.
fn directive(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start_matches('\u{feff}').trim_end();
    let rest = line.strip_prefix("##")?;
    let (key, value) = rest.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Parse manifest content line by line.
///
/// A read error aborts the whole parse; a partially filled package is never
/// returned.
pub fn parse_manifest<B: BufRead>(name: &str, reader: B) -> std::io::Result<Package> {
    let mut package = Package::new(name);

    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some((key, value)) = directive(&line) {
            package.apply(key, value);
        }
    }

    Ok(package)
}

/// Read the manifest of package `name` at `path`.
#[tracing::instrument(skip(runtime))]
pub fn scan_manifest<R: Runtime>(runtime: &R, name: &str, path: &Path) -> Result<Package, AddonError> {
    if !runtime.exists(path) {
        return Err(AddonError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = runtime.open(path).map_err(|e| AddonError::ManifestRead {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    parse_manifest(name, BufReader::new(file)).map_err(|e| AddonError::ManifestRead {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Scan every immediate subdirectory of the install directory.
///
/// Failing to list the directory itself is fatal. Per-package failures are
/// returned alongside the folder name so the caller can decide whether to
/// warn or skip.
#[tracing::instrument(skip(runtime))]
pub fn scan_install_dir<R: Runtime>(
    runtime: &R,
    install_dir: &Path,
) -> Result<Vec<(String, Result<Package, AddonError>)>> {
    debug!("Walking dir {}", install_dir.display());

    let mut entries = runtime
        .read_dir(install_dir)
        .with_context(|| format!("Failed to list add-on directory {}", install_dir.display()))?;
    entries.sort();

    let mut scanned = Vec::new();
    for entry in entries {
        if !runtime.is_dir(&entry) {
            debug!("Skipping non-directory {}", entry.display());
            continue;
        }
        let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let path = manifest_path(install_dir, &name);
        let result = scan_manifest(runtime, &name, &path);
        scanned.push((name, result));
    }

    Ok(scanned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn parse(content: &str) -> Package {
        parse_manifest("Foo", Cursor::new(content.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_parse_full_manifest() {
        let package = parse(
            "## Title: Foo Bar\n\
             ## Description: Does foo things\n\
             ## Version: 1.2.3\n\
             ## APIVersion: 101041\n\
             ## DependsOn: A B C\n\
             Foo.lua\n",
        );

        assert_eq!(package.name, "Foo");
        assert_eq!(package.title.as_deref(), Some("Foo Bar"));
        assert_eq!(package.description.as_deref(), Some("Does foo things"));
        assert_eq!(package.version.as_deref(), Some("1.2.3"));
        assert_eq!(package.dependencies, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parse_without_depends_on() {
        let package = parse("## Title: Foo\n");
        assert!(package.dependencies.is_empty());
    }

    #[test]
    fn test_parse_empty_depends_on() {
        assert!(parse("## DependsOn: \n").dependencies.is_empty());
        assert!(parse("## DependsOn:\n").dependencies.is_empty());
    }

    #[test]
    fn test_parse_no_recognised_lines() {
        let package = parse("; comment\nFoo.lua\n\n");
        assert_eq!(package, Package::new("Foo"));
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let package = parse("\u{feff}## Title: Foo\r\n## DependsOn: LibA LibB>=3\r\n");
        assert_eq!(package.title.as_deref(), Some("Foo"));
        assert_eq!(package.dependencies, vec!["LibA", "LibB>=3"]);
    }

    #[test]
    fn test_parse_value_containing_colon() {
        let package = parse("## Description: Usage: /foo\n");
        assert_eq!(package.description.as_deref(), Some("Usage: /foo"));
    }

    #[test]
    fn test_parse_invalid_utf8_is_lossy() {
        let mut bytes = b"## Title: Caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b"\n## Version: 2\n");

        let package = parse_manifest("Foo", Cursor::new(bytes)).unwrap();
        assert_eq!(package.version.as_deref(), Some("2"));
        assert!(package.title.unwrap().starts_with("Caf"));
    }

    #[test]
    fn test_parse_read_error_is_not_partial() {
        struct FailingReader {
            served: bool,
        }

        impl std::io::Read for FailingReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.served {
                    return Err(std::io::Error::other("device went away"));
                }
                self.served = true;
                let data = b"## Title: Foo\n## Vers";
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
        }

        let result = parse_manifest("Foo", BufReader::new(FailingReader { served: false }));
        assert!(result.is_err());
    }

    #[test]
    fn test_dependency_refs() {
        let mut package = Package::new("Foo");
        package.dependencies = vec!["LibAddonMenu-2.0>=30".into(), "LibStub".into()];

        let refs: Vec<_> = package.dependency_refs().collect();
        assert_eq!(refs[0].name, "LibAddonMenu-2.0");
        assert_eq!(refs[0].min_version.as_deref(), Some("30"));
        assert_eq!(refs[1].name, "LibStub");
    }

    #[test]
    fn test_display_title_falls_back_to_name() {
        let mut package = Package::new("Foo");
        assert_eq!(package.display_title(), "Foo");
        package.title = Some("Foo Deluxe".into());
        assert_eq!(package.display_title(), "Foo Deluxe");
    }

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            manifest_path(Path::new("/addons"), "Foo"),
            PathBuf::from("/addons/Foo/Foo.txt")
        );
    }

    #[test]
    fn test_scan_manifest_not_found() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/addons/Foo/Foo.txt");

        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| false);

        let err = scan_manifest(&runtime, "Foo", &path).unwrap_err();
        assert!(err.is_manifest_not_found());
    }

    #[test]
    fn test_scan_manifest_open_error() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/addons/Foo/Foo.txt");

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_open()
            .with(eq(path.clone()))
            .returning(|_| Err(anyhow::anyhow!("permission denied")));

        let err = scan_manifest(&runtime, "Foo", &path).unwrap_err();
        assert!(matches!(err, AddonError::ManifestRead { .. }));
    }

    #[test]
    fn test_scan_manifest_reads_through_runtime() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/addons/Foo/Foo.txt");

        runtime.expect_exists().returning(|_| true);
        runtime.expect_open().returning(|_| {
            Ok(Box::new(Cursor::new(b"## DependsOn: Bar\n".to_vec())))
        });

        let package = scan_manifest(&runtime, "Foo", &path).unwrap();
        assert_eq!(package.dependencies, vec!["Bar"]);
    }

    #[test]
    fn test_scan_install_dir_list_failure_is_fatal() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("no such directory")));

        let result = scan_install_dir(&runtime, Path::new("/addons"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_install_dir_real_filesystem() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("Foo")).unwrap();
        std::fs::write(root.join("Foo/Foo.txt"), "## Title: Foo\n## DependsOn: Bar\n").unwrap();
        std::fs::create_dir_all(root.join("Broken")).unwrap();
        std::fs::write(root.join("stray.txt"), "not an add-on").unwrap();

        let scanned = scan_install_dir(&RealRuntime, root).unwrap();

        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].0, "Broken");
        assert!(scanned[0].1.as_ref().unwrap_err().is_manifest_not_found());
        assert_eq!(scanned[1].0, "Foo");
        assert_eq!(scanned[1].1.as_ref().unwrap().dependencies, vec!["Bar"]);
    }
}
