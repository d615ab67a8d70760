use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "discforge")]
#[command(author, version, about = "Unattended optical disc extraction and transcode pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the drive and rip, then transcode, every disc inserted
    Run {
        /// Answer every title prompt with this selection (e.g. "all", "0,2-4")
        #[arg(long)]
        select: Option<String>,
    },

    /// Show the title catalog of the disc in the drive
    Scan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transcode raw files left over from earlier runs
    Backlog,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
