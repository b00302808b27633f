//! Command-line argument definitions for the Maquette CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, parser restrictions and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Maquette workspace tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input workspace file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output text dump
    #[arg(short, long, default_value = "out.txt")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Parse in restricted mode: no filesystem access, no extensions
    #[arg(long)]
    pub restricted: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
