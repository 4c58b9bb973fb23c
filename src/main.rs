//! swa - Static web assets manifest and endpoint generator.

#![allow(dead_code)]

mod address;
mod asset;
mod cli;
mod config;
mod endpoint;
mod freshness;
mod logger;
mod manifest;
mod utils;

use anyhow::Result;
use asset::ManifestType;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProjectConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.is_verbose());

    match &cli.command {
        Commands::Build { force, .. } => {
            let config = ProjectConfig::load(&cli.config)?;
            cli::build::build_project(&config, *force).map(|_| ())
        }
        Commands::Clean => {
            let config = ProjectConfig::load(&cli.config)?;
            cli::clean::clean_project(&config).map(|_| ())
        }
        Commands::Inspect { publish, endpoints } => {
            let config = ProjectConfig::load(&cli.config)?;
            let phase = if *publish {
                ManifestType::Publish
            } else {
                ManifestType::Build
            };
            cli::inspect::inspect_manifest(&config, phase, *endpoints)
        }
        Commands::Fingerprint { file } => cli::fingerprint::print_fingerprint(file),
    }
}
