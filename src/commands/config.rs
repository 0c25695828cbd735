use crate::core::Config;
use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

pub fn execute(matches: &ArgMatches, config: &Config) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(config),
        Some(("path", _)) => path(),
        Some(("init", sub_matches)) => init(sub_matches.get_flag("force")),
        _ => {
            println!("Use 'hostmon config --help' for more information.");
            Ok(())
        }
    }
}

/// Print the effective configuration
fn show(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Write the default configuration, keeping an existing file unless forced
fn init(force: bool) -> Result<()> {
    let path = Config::config_path()?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("{}", "Use --force to overwrite it with defaults.".dimmed());
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!(
        "{}",
        format!("Wrote default config to {}", path.display()).green()
    );
    Ok(())
}
