use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::runtime::Runtime;

use super::paths::{TargetOs, default_install_dir};

/// Config file looked up in the home directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".eso_addons";

/// On-disk TOML config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigFile {
    pub addons_path: Option<PathBuf>,
    pub catalog_url: Option<String>,
}

impl ConfigFile {
    /// Load the file at `path`, or `None` when it does not exist.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Option<Self>> {
        if !runtime.exists(path) {
            return Ok(None);
        }
        let content = runtime.read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(file))
    }
}

/// Values given on the command line (or their environment variables).
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
    pub catalog_url: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub install_dir: PathBuf,
    pub catalog_url: String,
}

impl Config {
    /// Resolve settings: command line, then config file, then defaults.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let home = runtime.home_dir();

        let config_path = overrides
            .config_path
            .or_else(|| home.as_ref().map(|h| h.join(CONFIG_FILE_NAME)));

        let file = match &config_path {
            Some(path) => ConfigFile::load(runtime, path)?.unwrap_or_else(|| {
                warn!("Failed to find config file {}", path.display());
                ConfigFile::default()
            }),
            None => ConfigFile::default(),
        };
        debug!("Config file: {:?}", file);

        let install_dir = match overrides.install_dir.or(file.addons_path) {
            Some(path) => path,
            None => {
                let home = home.context("Could not find home directory")?;
                default_install_dir(TargetOs::current(), &home)
            }
        };
        info!("Using add-on directory: {}", install_dir.display());

        let catalog_url = overrides
            .catalog_url
            .or(file.catalog_url)
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

        Ok(Self {
            install_dir,
            catalog_url,
        })
    }
}
