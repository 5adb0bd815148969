use anyhow::{Context, Result};
use log::info;

use crate::{
    closure::{ClosureOptions, ClosureReport, ReinstallScope, Seed},
    manifest::{Package, scan_install_dir},
    runtime::Runtime,
};

pub mod config;
mod paths;
mod services;

pub use config::{Config, ConfigOverrides};
pub use paths::{TargetOs, default_install_dir};
pub use services::Services;

/// Print one line per installed add-on.
#[tracing::instrument(skip(runtime))]
pub fn list<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<()> {
    let config = Config::load(runtime, overrides)?;

    info!("Walking dir {}", config.install_dir.display());
    for (name, result) in scan_install_dir(runtime, &config.install_dir)? {
        match result {
            Ok(package) => println!("{}", listing_line(&package)),
            Err(e) => eprintln!("skipped: {}: {}", name, e),
        }
    }
    Ok(())
}

/// Install the named add-ons (or direct links) and whatever they depend on.
#[tracing::instrument(skip(runtime))]
pub async fn install<R: Runtime>(
    runtime: &R,
    overrides: ConfigOverrides,
    names: Vec<String>,
    options: ClosureOptions,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    runtime
        .create_dir_all(&config.install_dir)
        .with_context(|| format!("Failed to create {}", config.install_dir.display()))?;

    let services = Services::build(runtime, &config)?;
    let report = services
        .engine(&config.install_dir)
        .resolve_all(Seed::Named(names), options)
        .await?;

    print_report(&report);
    Ok(())
}

/// Reinstall every installed add-on and fill in missing dependencies.
#[tracing::instrument(skip(runtime))]
pub async fn update<R: Runtime>(
    runtime: &R,
    overrides: ConfigOverrides,
    scope: ReinstallScope,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let services = Services::build(runtime, &config)?;
    let options = ClosureOptions {
        force_reinstall: true,
        scope,
    };

    let report = services
        .engine(&config.install_dir)
        .resolve_all(Seed::Installed, options)
        .await?;

    print_report(&report);
    Ok(())
}

/// `Title Version -- Description`, with the folder name standing in for a
/// missing title.
pub fn listing_line(package: &Package) -> String {
    format!(
        "{} {} -- {}",
        package.display_title(),
        package.version.as_deref().unwrap_or_default(),
        package.description.as_deref().unwrap_or_default()
    )
}

fn print_report(report: &ClosureReport) {
    for line in report_lines(report) {
        println!("{}", line);
    }
}

fn report_lines(report: &ClosureReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .fetched
        .iter()
        .map(|name| format!("installed: {}", name))
        .collect();

    for (name, e) in &report.skipped {
        lines.push(format!("skipped: {}: {}", name, e));
    }

    for (name, e) in &report.failures {
        lines.push(format!("failed: {}: {}", name, e));
        if e.is_link_not_found() {
            lines.push(format!(
                "hint: could not find {} in the catalog; consider pasting a direct link to its download page",
                name
            ));
        }
    }

    lines.push(format!(
        "Done! {} installed, {} failed",
        report.fetched.len(),
        report.failures.len()
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AddonError;

    #[test]
    fn test_listing_line_full_manifest() {
        let package = Package {
            name: "Foo".into(),
            title: Some("Foo Bar".into()),
            description: Some("Does foo things".into()),
            version: Some("1.2.3".into()),
            dependencies: vec![],
        };
        assert_eq!(listing_line(&package), "Foo Bar 1.2.3 -- Does foo things");
    }

    #[test]
    fn test_listing_line_falls_back_to_folder_name() {
        assert_eq!(listing_line(&Package::new("LibBar")), "LibBar  -- ");
    }

    #[test]
    fn test_report_lines() {
        let report = ClosureReport {
            fetched: vec!["Bar".into()],
            failures: vec![
                (
                    "Nope".into(),
                    AddonError::link_not_found("https://www.esoui.com", "link labelled \"Nope\""),
                ),
                (
                    "Gone".into(),
                    AddonError::io("Failed to create AddOns/Gone", anyhow::anyhow!("disk full")),
                ),
            ],
            ..Default::default()
        };

        let lines = report_lines(&report);

        assert_eq!(lines[0], "installed: Bar");
        assert_eq!(
            lines[1],
            "failed: Nope: No link labelled \"Nope\" found at https://www.esoui.com"
        );
        assert!(lines[2].starts_with("hint: could not find Nope"));
        assert_eq!(
            lines[3],
            "failed: Gone: Failed to create AddOns/Gone: disk full"
        );
        assert_eq!(lines[4], "Done! 1 installed, 2 failed");
    }

    #[test]
    fn test_report_lines_empty_run() {
        assert_eq!(
            report_lines(&ClosureReport::default()),
            vec!["Done! 0 installed, 0 failed"]
        );
    }
}
