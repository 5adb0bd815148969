use anyhow::Result;
use clap::Parser;
use eso_addons::closure::{ClosureOptions, ReinstallScope};
use eso_addons::commands::{self, ConfigOverrides};
use std::path::PathBuf;

/// eso-addons - Elder Scrolls Online add-on manager
///
/// Installs add-ons from the ESOUI catalog together with everything they
/// declare in `DependsOn`.
///
/// Examples:
///   eso-addons list                 # Show installed add-ons
///   eso-addons install LibAddonMenu # Install an add-on and its dependencies
///   eso-addons update               # Reinstall everything that is installed
#[derive(Parser, Debug)]
#[command(author, version = env!("ESO_ADDONS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.eso_addons)
    #[arg(long = "config", short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Add-on directory (overrides the config file; also via ESO_ADDONS_PATH)
    #[arg(
        long = "path",
        short = 'p',
        env = "ESO_ADDONS_PATH",
        value_name = "PATH",
        global = true
    )]
    pub path: Option<PathBuf>,

    /// Catalog base URL (defaults to https://www.esoui.com)
    #[arg(long = "catalog-url", value_name = "URL", global = true)]
    pub catalog_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List installed add-ons
    List,

    /// Install add-ons by name or download page link
    Install(InstallArgs),

    /// Reinstall installed add-ons and fetch missing dependencies
    Update(UpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Add-on names as shown in the catalog, or direct download page links
    #[arg(value_name = "NAME|URL", required = true)]
    pub names: Vec<String>,

    /// Reinstall even if already installed
    #[arg(long)]
    pub force: bool,

    /// What --force reinstalls
    #[arg(long, value_enum, default_value = "seeds")]
    pub scope: ReinstallScope,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Reinstall only installed add-ons, or everything reached through them
    #[arg(long, value_enum, default_value = "closure")]
    pub scope: ReinstallScope,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            install_dir: self.path.clone(),
            catalog_url: self.catalog_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = eso_addons::runtime::RealRuntime;
    let overrides = cli.overrides();

    match cli.command {
        Commands::List => commands::list(&runtime, overrides)?,
        Commands::Install(args) => {
            let options = ClosureOptions {
                force_reinstall: args.force,
                scope: args.scope,
            };
            commands::install(&runtime, overrides, args.names, options).await?
        }
        Commands::Update(args) => commands::update(&runtime, overrides, args.scope).await?,
    }
    Ok(())
}
