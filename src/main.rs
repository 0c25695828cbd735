use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use hostmon::commands;
use hostmon::core::config::Config;

fn build_cli() -> Command {
    Command::new("hostmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Host telemetry sampler for CPU, memory, disks, network and GPUs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("monitor")
                .about("Sample the host once per second until interrupted")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON snapshot per line")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Print a single snapshot and exit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the configuration file (use 'hostmon config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the configuration file path"))
                .subcommand(
                    Command::new("init")
                        .about("Write a configuration file with default values")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .help("Overwrite an existing configuration file")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config = Config::load().context("Failed to load configuration")?;
    config.validate()?;
    hostmon::init_logging(config.log_level.as_deref());

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor::execute(sub_matches, &config),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches, &config),
        _ => {
            println!("Use 'hostmon --help' for more information.");
            Ok(())
        }
    }
}
