//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Static web assets manifest and endpoint generator
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'c', long, global = true, default_value = "swa.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Discover assets and write the build, publish and runtime manifests
    #[command(visible_alias = "b")]
    Build {
        /// Rebuild even when every input is up to date
        #[arg(short, long)]
        force: bool,

        /// Print debug output
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Remove generated manifests, compressed files and build state
    Clean,

    /// Summarize a written manifest
    #[command(visible_alias = "i")]
    Inspect {
        /// Read the publish manifest instead of the build manifest
        #[arg(short, long)]
        publish: bool,

        /// List every endpoint with its selectors
        #[arg(short, long)]
        endpoints: bool,
    },

    /// Print the fingerprint and integrity of a file
    #[command(visible_alias = "f")]
    Fingerprint {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        matches!(self.command, Commands::Build { verbose: true, .. })
    }
}
