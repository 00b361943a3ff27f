//! CLI command definitions using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LED climbing-wall panel controller
#[derive(Parser)]
#[command(name = "holdlight", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Run the animation loop until Ctrl-C
    Run {
        /// TOML config file (built-in defaults when omitted)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Sleep between frames, overrides the config file
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Validate a layout file and print its channel usage
    Check {
        /// Layout file
        layout: PathBuf,

        /// Only pixels of this panel (6-field lines)
        #[arg(long)]
        panel_id: Option<i32>,
    },
}
