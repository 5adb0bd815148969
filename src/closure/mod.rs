//! Dependency closure resolution.
//!
//! The engine keeps a FIFO worklist of dependency references. Each pass pops
//! the head, skips it when it is already satisfied, and otherwise resolves,
//! installs and rescans it, appending whatever the fresh package depends on
//! to the tail. Per-package failures are collected in the [`ClosureReport`]
//! and never stop the drain.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;

use anyhow::Result;
use log::{debug, info, warn};

use crate::catalog::LinkResolver;
use crate::error::AddonError;
use crate::install::Installer;
use crate::manifest::{DependencyRef, Package, manifest_path, scan_install_dir, scan_manifest};
use crate::runtime::Runtime;

/// Where the initial worklist comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    /// Every dependency declared by the installed packages.
    Installed,
    /// Names or direct links given by the user.
    Named(Vec<String>),
}

/// Which entries a forced reinstall applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReinstallScope {
    /// Only the initial worklist entries
    #[value(name = "seeds")]
    SeedsOnly,
    /// Every entry reached while draining
    #[default]
    #[value(name = "closure")]
    FullClosure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureOptions {
    pub force_reinstall: bool,
    pub scope: ReinstallScope,
}

impl ClosureOptions {
    fn forces(&self, seed: bool) -> bool {
        self.force_reinstall && (seed || self.scope == ReinstallScope::FullClosure)
    }
}

#[derive(Debug)]
struct Pending {
    dep: DependencyRef,
    seed: bool,
}

/// Outcome of one closure run.
#[derive(Debug, Default)]
pub struct ClosureReport {
    /// Installed-set after the run, keyed by folder name
    pub installed: BTreeMap<String, Package>,
    /// Identifiers fetched successfully, in fetch order
    pub fetched: Vec<String>,
    /// Identifiers that could not be fetched
    pub failures: Vec<(String, AddonError)>,
    /// Folders whose manifest could not be scanned
    pub skipped: Vec<(String, AddonError)>,
}

impl ClosureReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ClosureEngine<'a, R: Runtime, L: LinkResolver, I: Installer> {
    runtime: &'a R,
    resolver: &'a L,
    installer: &'a I,
    install_dir: &'a Path,
}

impl<'a, R: Runtime, L: LinkResolver, I: Installer> ClosureEngine<'a, R, L, I> {
    pub fn new(runtime: &'a R, resolver: &'a L, installer: &'a I, install_dir: &'a Path) -> Self {
        Self {
            runtime,
            resolver,
            installer,
            install_dir,
        }
    }

    /// Drive the worklist until it is empty.
    ///
    /// Only a failure to list the install directory is returned as an error;
    /// everything else ends up in the report.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_all(&self, seed: Seed, options: ClosureOptions) -> Result<ClosureReport> {
        let mut report = ClosureReport::default();

        info!("Walking dir {}", self.install_dir.display());
        for (name, result) in scan_install_dir(self.runtime, self.install_dir)? {
            match result {
                Ok(package) => {
                    report.installed.insert(name, package);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    report.skipped.push((name, e));
                }
            }
        }

        let mut worklist = self.seed_worklist(&report.installed, seed, options);
        // Names installed during this run are never fetched twice
        let mut fetched: HashSet<String> = HashSet::new();

        while let Some(entry) = worklist.pop_front() {
            let name = &entry.dep.name;

            if fetched.contains(name) {
                debug!("{} already fetched this run", name);
                continue;
            }
            if report.installed.contains_key(name) && !options.forces(entry.seed) {
                debug!("{} is satisfied", name);
                continue;
            }

            info!("Updating add-on {}", entry.dep);
            let folders = match self.fetch(name).await {
                Ok(folders) => folders,
                Err(e) => {
                    warn!("Failed to install add-on {}: {}", name, e);
                    report.failures.push((name.clone(), e));
                    continue;
                }
            };

            fetched.insert(name.clone());
            report.fetched.push(name.clone());

            for package in self.rescan(name, folders, &mut report) {
                debug!("{} depends on {:?}", package.name, package.dependencies);
                worklist.extend(package.dependency_refs().map(|dep| Pending { dep, seed: false }));
                fetched.insert(package.name.clone());
                report.installed.insert(package.name.clone(), package);
            }
        }

        info!(
            "Closure complete: {} fetched, {} failed",
            report.fetched.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn seed_worklist(
        &self,
        installed: &BTreeMap<String, Package>,
        seed: Seed,
        options: ClosureOptions,
    ) -> VecDeque<Pending> {
        let seeds: Vec<DependencyRef> = match seed {
            Seed::Named(names) => names.iter().map(|n| DependencyRef::parse(n)).collect(),
            Seed::Installed => {
                let reinstall = installed
                    .keys()
                    .filter(|_| options.force_reinstall)
                    .map(|name| DependencyRef::parse(name));
                let declared = installed.values().flat_map(|p| p.dependency_refs());
                reinstall.chain(declared).collect()
            }
        };

        seeds
            .into_iter()
            .map(|dep| Pending { dep, seed: true })
            .collect()
    }

    async fn fetch(&self, identifier: &str) -> Result<Vec<String>, AddonError> {
        let url = self.resolver.resolve(identifier).await?;
        info!("Downloading {} from {}", identifier, url);
        self.installer.install(&url, self.install_dir).await
    }

    /// Scan the folders an install produced.
    ///
    /// A folder without a readable manifest still yields a bare package so
    /// the name counts as satisfied for the rest of the run.
    fn rescan(&self, identifier: &str, folders: Vec<String>, report: &mut ClosureReport) -> Vec<Package> {
        let folders = if !folders.is_empty() {
            folders
        } else if DependencyRef::parse(identifier).is_url() {
            warn!("Archive from {} contained no add-on folder", identifier);
            return Vec::new();
        } else {
            vec![identifier.to_string()]
        };

        folders
            .into_iter()
            .map(|folder| {
                let path = manifest_path(self.install_dir, &folder);
                match scan_manifest(self.runtime, &folder, &path) {
                    Ok(package) => package,
                    Err(e) => {
                        warn!("Installed {} but could not scan it: {}", folder, e);
                        report.skipped.push((folder.clone(), e));
                        Package::new(folder)
                    }
                }
            })
            .collect()
    }
}
