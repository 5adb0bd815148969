//! Service factory for building command dependencies.
//!
//! Services are built from configuration values but are not part of the
//! configuration itself.

use anyhow::{Context, Result};
use std::path::Path;

use crate::{
    catalog::CatalogResolver,
    closure::ClosureEngine,
    http::build_http_client,
    install::PackageInstaller,
    runtime::Runtime,
};

use super::config::Config;

/// Everything a closure run talks to.
pub struct Services<'a, R: Runtime> {
    pub runtime: &'a R,
    pub resolver: CatalogResolver,
    pub installer: PackageInstaller<'a, R>,
}

impl<'a, R: Runtime> Services<'a, R> {
    pub fn build(runtime: &'a R, config: &Config) -> Result<Self> {
        let http_client = build_http_client().context("Failed to build HTTP client")?;
        let resolver = CatalogResolver::new(http_client.clone(), &config.catalog_url)?;
        let installer = PackageInstaller::new(runtime, http_client);

        Ok(Self {
            runtime,
            resolver,
            installer,
        })
    }

    pub fn engine<'s>(
        &'s self,
        install_dir: &'s Path,
    ) -> ClosureEngine<'s, R, CatalogResolver, PackageInstaller<'a, R>> {
        ClosureEngine::new(self.runtime, &self.resolver, &self.installer, install_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::path::PathBuf;

    #[test]
    fn test_build_uses_catalog_url() {
        let config = Config {
            install_dir: PathBuf::from("/tmp/AddOns"),
            catalog_url: "http://catalog.test:8080".into(),
        };

        let services = Services::build(&RealRuntime, &config).unwrap();

        assert_eq!(
            services.resolver.base_url().as_str(),
            "http://catalog.test:8080/"
        );
    }

    #[test]
    fn test_build_rejects_bad_catalog_url() {
        let config = Config {
            install_dir: PathBuf::from("/tmp/AddOns"),
            catalog_url: "catalog without scheme".into(),
        };

        assert!(Services::build(&RealRuntime, &config).is_err());
    }
}
